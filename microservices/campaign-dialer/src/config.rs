//! Configuration for the Campaign Dialer microservice

use std::net::SocketAddr;

/// Campaign Dialer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Vapi API base URL
    pub vapi_base_url: String,
    /// Vapi API key (bearer token)
    pub vapi_api_key: String,
    /// Assistant used when a contact has no campaign
    pub default_assistant_id: String,
    /// Outbound number used when a contact has no campaign
    pub default_phone_number_id: String,
    /// Seconds between staggered calls in a batch
    pub call_stagger_secs: u64,
    /// Seconds between queue processor passes
    pub queue_poll_secs: u64,
    /// Whether the campaign queue processor runs
    pub queue_enabled: bool,
    /// Attempt ceiling for contacts without a campaign
    pub default_max_attempts: i32,
    /// Timeout for outbound HTTP calls (seconds)
    pub http_timeout_secs: u64,
    /// SMTP alerting, disabled when unset
    pub smtp: Option<SmtpConfig>,
}

/// SMTP settings for best-effort email alerts
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let smtp = match (std::env::var("SMTP_HOST"), std::env::var("NOTIFY_TO")) {
            (Ok(host), Ok(to)) => Some(SmtpConfig {
                host,
                port: std::env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()?,
                username: std::env::var("SMTP_USER").unwrap_or_default(),
                password: std::env::var("SMTP_PASS").unwrap_or_default(),
                from: std::env::var("NOTIFY_FROM")
                    .unwrap_or_else(|_| "dialer@localhost".to_string()),
                to,
            }),
            _ => None,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8097".to_string())
                .parse()?,
            vapi_base_url: std::env::var("VAPI_BASE_URL")
                .unwrap_or_else(|_| "https://api.vapi.ai".to_string()),
            vapi_api_key: std::env::var("VAPI_API_KEY").unwrap_or_default(),
            default_assistant_id: std::env::var("DEFAULT_ASSISTANT_ID").unwrap_or_default(),
            default_phone_number_id: std::env::var("DEFAULT_PHONE_NUMBER_ID").unwrap_or_default(),
            call_stagger_secs: std::env::var("CALL_STAGGER_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            queue_poll_secs: std::env::var("QUEUE_POLL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            queue_enabled: std::env::var("QUEUE_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            default_max_attempts: std::env::var("DEFAULT_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            smtp,
        })
    }

    /// Get socket address for binding
    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
