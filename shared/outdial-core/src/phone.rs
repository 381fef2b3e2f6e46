//! E.164 phone number normalization

use crate::error::{OutdialError, Result};

/// Normalize a raw phone string to E.164.
///
/// Strips every non-digit character, then:
/// - 10 digits: assumed NANP, prefixed `+1`
/// - 11 digits with a leading 1: prefixed `+`
/// - 11-15 digits otherwise: passed through with a leading `+`
/// - fewer than 10 or more than 15 digits: rejected
pub fn format_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => Ok(format!("+1{digits}")),
        11 if digits.starts_with('1') => Ok(format!("+{digits}")),
        11..=15 => Ok(format!("+{digits}")),
        n => Err(OutdialError::Validation(format!(
            "invalid phone number {raw:?}: {n} digits after stripping"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_digit_gets_country_code() {
        assert_eq!(format_phone("555-123-4567").unwrap(), "+15551234567");
        assert_eq!(format_phone("(555) 123 4567").unwrap(), "+15551234567");
    }

    #[test]
    fn test_eleven_digit_leading_one() {
        assert_eq!(format_phone("1-555-987-6543").unwrap(), "+15559876543");
        assert_eq!(format_phone("+1 555 987 6543").unwrap(), "+15559876543");
    }

    #[test]
    fn test_international_pass_through() {
        // 11 digits without a leading 1
        assert_eq!(format_phone("44 20 7946 0958").unwrap(), "+442079460958");
        // 12 digits
        assert_eq!(format_phone("+233 24 123 4567").unwrap(), "+233241234567");
        // 15 digits, the E.164 maximum
        assert_eq!(
            format_phone("123456789012345").unwrap(),
            "+123456789012345"
        );
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(format_phone("555-1234").is_err());
        // 9 digits
        assert!(format_phone("555123456").is_err());
        assert!(format_phone("").is_err());
    }

    #[test]
    fn test_too_long_rejected() {
        // 16 digits
        assert!(format_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_non_digit_noise_stripped() {
        assert_eq!(format_phone("ext. 555.123.4567 ").unwrap(), "+15551234567");
    }
}
