//! Best-effort email alerting
//!
//! Alerts are side channels, never control flow: every failure here is
//! logged and swallowed, and callers fire these through `tokio::spawn` so a
//! slow SMTP relay cannot stall a dispatch pass.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::contacts::Contact;

/// Email notifier. Disabled (a no-op) when SMTP is not configured.
pub struct Notifier {
    smtp: Option<SmtpNotifier>,
}

struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl Notifier {
    pub fn disabled() -> Self {
        Self { smtp: None }
    }

    pub fn from_config(config: Option<&SmtpConfig>) -> Self {
        let Some(config) = config else {
            tracing::warn!("SMTP not configured, email alerts disabled");
            return Self::disabled();
        };

        let relay = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host) {
            Ok(relay) => relay,
            Err(e) => {
                tracing::error!(host = %config.host, "Invalid SMTP relay, alerts disabled: {e}");
                return Self::disabled();
            }
        };

        let mailer = relay
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Self {
            smtp: Some(SmtpNotifier {
                mailer,
                from: config.from.clone(),
                to: config.to.clone(),
            }),
        }
    }

    /// Send one plain-text alert. Failures are logged, never returned.
    pub async fn notify(&self, subject: &str, body: &str) {
        let Some(smtp) = &self.smtp else {
            tracing::debug!(subject, "Alert skipped, SMTP disabled");
            return;
        };

        let from: Mailbox = match smtp.from.parse() {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(from = %smtp.from, "Invalid alert sender: {e}");
                return;
            }
        };
        let to: Mailbox = match smtp.to.parse() {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(to = %smtp.to, "Invalid alert recipient: {e}");
                return;
            }
        };

        let message = match Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
        {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(subject, "Failed to build alert email: {e}");
                return;
            }
        };

        if let Err(e) = smtp.mailer.send(message).await {
            tracing::error!(subject, "Failed to send alert email: {e}");
        } else {
            tracing::info!(subject, "Alert email sent");
        }
    }

    pub async fn notify_long_call(&self, contact: &Contact, duration_seconds: i32) {
        let name = contact.display_name();
        let subject = format!("Call > 30s: {name}");
        let body = format!(
            "A call lasted {duration_seconds} seconds.\n\n\
             Contact: {name}\n\
             Company: {}\n\
             Phone: {}\n\
             Duration: {duration_seconds}s",
            contact.company.as_deref().unwrap_or("unknown"),
            contact.phone,
        );
        self.notify(&subject, &body).await;
    }

    pub async fn notify_call_error(&self, error: &str, context: serde_json::Value) {
        let body = format!(
            "An error occurred with Vapi.\n\nError: {error}\n\nContext:\n{}",
            serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string()),
        );
        self.notify("Vapi Error", &body).await;
    }
}
