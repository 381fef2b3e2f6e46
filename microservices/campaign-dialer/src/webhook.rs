//! Provider webhook processing
//!
//! Consumes Vapi call-lifecycle events. The provider retries non-200
//! responses, so every path acknowledges with HTTP 200; failures are logged
//! and alerted, never surfaced. Payloads arrive either wrapped in a
//! `message` envelope or flat, and field layouts drift between provider
//! versions, so extraction is an ordered list of candidate paths.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::call_logs::CallReport;
use crate::notify::Notifier;
use crate::store::DialerStore;
use crate::Result;
use outdial_core::CallOutcome;

const LONG_CALL_SECONDS: i32 = 30;

/// Acknowledgement body. Always returned with HTTP 200.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn received() -> Self {
        Self {
            received: true,
            status: None,
            error: None,
        }
    }

    fn with_status(status: &str) -> Self {
        Self {
            received: true,
            status: Some(status.to_string()),
            error: None,
        }
    }

    fn with_error(error: &str) -> Self {
        Self {
            received: true,
            status: None,
            error: Some(error.to_string()),
        }
    }
}

pub struct WebhookProcessor {
    store: Arc<dyn DialerStore>,
    notifier: Arc<Notifier>,
    default_max_attempts: i32,
}

impl WebhookProcessor {
    pub fn new(
        store: Arc<dyn DialerStore>,
        notifier: Arc<Notifier>,
        default_max_attempts: i32,
    ) -> Self {
        Self {
            store,
            notifier,
            default_max_attempts,
        }
    }

    /// Handle one webhook payload. Never fails: internal errors become an
    /// acknowledgement with an `error` field.
    pub async fn process(&self, payload: &Value) -> WebhookAck {
        let message = payload.get("message").unwrap_or(payload);

        let event_type = first_str(message, &["/type"]).unwrap_or_default();

        match event_type {
            "end-of-call-report" => match self.process_end_of_call(message).await {
                Ok(ack) => ack,
                Err(e) => {
                    tracing::error!("Webhook processing failed: {e}");
                    let notifier = Arc::clone(&self.notifier);
                    let error_text = e.to_string();
                    let context = json!({"event": "end-of-call-report"});
                    tokio::spawn(async move {
                        notifier.notify_call_error(&error_text, context).await;
                    });
                    WebhookAck::with_error("Processing failed")
                }
            },
            "status-update" => {
                let status = first_str(message, &["/status"]).unwrap_or_default();
                if status == "error" || status == "failed" {
                    let detail = first_str(message, &["/error", "/endedReason"])
                        .unwrap_or("unknown")
                        .to_string();
                    tracing::error!(status, "Call status update reported an error: {detail}");
                    let notifier = Arc::clone(&self.notifier);
                    let context = message.clone();
                    tokio::spawn(async move {
                        notifier.notify_call_error(&detail, context).await;
                    });
                }
                WebhookAck::received()
            }
            other => {
                tracing::debug!(event_type = other, "Ignoring webhook event");
                WebhookAck::received()
            }
        }
    }

    async fn process_end_of_call(&self, message: &Value) -> Result<WebhookAck> {
        let Some(vapi_call_id) = first_str(message, &["/call/id", "/callId", "/id"]) else {
            tracing::error!("No call id in webhook payload");
            return Ok(WebhookAck::received());
        };

        let Some(call_log) = self.store.call_log_by_vapi_id(vapi_call_id).await? else {
            tracing::error!(vapi_call_id, "Call log not found for webhook");
            return Ok(WebhookAck::received());
        };

        let ended_reason = first_str(message, &["/endedReason", "/call/endedReason"])
            .unwrap_or_default()
            .to_string();
        let duration = first_f64(message, &["/call/duration", "/durationSeconds"]).unwrap_or(0.0);
        let report = CallReport {
            ended_reason: ended_reason.clone(),
            duration_seconds: duration.round() as i32,
            transcript: first_str(message, &["/artifact/transcript"]).map(str::to_string),
            recording_url: first_str(message, &["/artifact/recording/url"]).map(str::to_string),
            cost: first_f64(message, &["/cost"]),
        };

        self.store.complete_call_log(call_log.id, &report).await?;

        let outcome = CallOutcome::from_ended_reason(&ended_reason);
        let final_status = match self.store.contact_by_id(call_log.contact_id).await? {
            Some(contact) => {
                let max_attempts = match contact.campaign_id {
                    Some(campaign_id) => self
                        .store
                        .campaign_by_id(campaign_id)
                        .await?
                        .map(|c| c.max_attempts)
                        .unwrap_or(self.default_max_attempts),
                    None => self.default_max_attempts,
                };

                let final_status = if outcome != CallOutcome::Answered
                    && contact.call_count >= max_attempts
                {
                    outdial_core::ContactStatus::Exhausted
                } else {
                    outcome.contact_status()
                };

                self.store
                    .finalize_contact(contact.id, final_status, outcome)
                    .await?;

                if report.duration_seconds > LONG_CALL_SECONDS {
                    let notifier = Arc::clone(&self.notifier);
                    let duration_seconds = report.duration_seconds;
                    tokio::spawn(async move {
                        notifier.notify_long_call(&contact, duration_seconds).await;
                    });
                }

                final_status
            }
            None => {
                tracing::error!(contact_id = %call_log.contact_id, "Contact missing for completed call");
                outcome.contact_status()
            }
        };

        tracing::info!(
            vapi_call_id,
            %ended_reason,
            status = %final_status,
            "Call completed"
        );
        Ok(WebhookAck::with_status(final_status.as_str()))
    }
}

/// First present string at any of the JSON pointer paths.
fn first_str<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths
        .iter()
        .find_map(|p| value.pointer(p).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

/// First present number at any of the JSON pointer paths.
fn first_f64(value: &Value, paths: &[&str]) -> Option<f64> {
    paths.iter().find_map(|p| value.pointer(p).and_then(Value::as_f64))
}
