//! Shared fixtures for the dispatch, queue, and webhook tests.

use chrono::Utc;
use outdial_core::{CampaignStatus, ContactStatus};
use uuid::Uuid;

use crate::campaigns::Campaign;
use crate::contacts::Contact;

pub const ACTIVE_CAMPAIGN_ID: Uuid = Uuid::from_u128(0xC0FFEE);

pub fn contact(phone: &str, status: ContactStatus) -> Contact {
    Contact {
        id: Uuid::new_v4(),
        campaign_id: None,
        phone: phone.to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        company: Some("Acme".to_string()),
        location: Some("Austin".to_string()),
        industry: Some("software".to_string()),
        status,
        outcome: None,
        call_count: 0,
        last_attempt_at: None,
        next_attempt_at: Utc::now() - chrono::Duration::minutes(1),
        created_at: Utc::now(),
    }
}

pub fn contact_in_campaign(phone: &str, status: ContactStatus, campaign_id: Uuid) -> Contact {
    Contact {
        campaign_id: Some(campaign_id),
        ..contact(phone, status)
    }
}

/// An always-open UTC campaign.
pub fn campaign(id: Uuid) -> Campaign {
    Campaign {
        id,
        name: "spring outreach".to_string(),
        assistant_id: "asst_campaign".to_string(),
        phone_number_id: "pn_campaign".to_string(),
        status: CampaignStatus::Active,
        calls_per_minute: 10,
        call_window_start: "00:00".to_string(),
        call_window_end: "23:59".to_string(),
        timezone: "UTC".to_string(),
        max_attempts: 2,
        retry_delay_minutes: 30,
        created_at: Utc::now(),
    }
}
