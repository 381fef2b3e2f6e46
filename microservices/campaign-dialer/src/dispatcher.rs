//! Batch call dispatcher
//!
//! Drives one dispatch pass over an explicit list of contacts: normalize the
//! phone, claim the contact with a guarded transition, create the provider
//! call, log it. Calls after the first are future-dated so the provider
//! paces the batch instead of dialing everyone at once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::campaigns::Campaign;
use crate::notify::Notifier;
use crate::store::DialerStore;
use crate::vapi::{CallGateway, CallVariables, CreateCallRequest};
use crate::{Error, Result};

/// Per-batch defaults used for contacts without a campaign.
#[derive(Debug, Clone)]
pub struct DispatchDefaults {
    pub assistant_id: String,
    pub phone_number_id: String,
    pub stagger: Duration,
}

/// Per-contact outcome of a dispatch pass.
#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    pub id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "vapiCallId", skip_serializing_if = "Option::is_none")]
    pub vapi_call_id: Option<String>,
    #[serde(rename = "scheduledAt", skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
}

impl CallResult {
    fn failure(id: Uuid, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error: Some(error.into()),
            vapi_call_id: None,
            scheduled_at: None,
        }
    }
}

/// Aggregate outcome of one dispatch pass.
#[derive(Debug, Serialize)]
pub struct DispatchSummary {
    pub success: bool,
    pub message: String,
    pub results: Vec<CallResult>,
}

pub struct Dispatcher {
    store: Arc<dyn DialerStore>,
    gateway: Arc<dyn CallGateway>,
    notifier: Arc<Notifier>,
    defaults: DispatchDefaults,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn DialerStore>,
        gateway: Arc<dyn CallGateway>,
        notifier: Arc<Notifier>,
        defaults: DispatchDefaults,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            defaults,
        }
    }

    /// Dispatch calls for the given contacts, optionally under a campaign.
    ///
    /// Stops the batch on the first gateway failure: the failing contact is
    /// rolled back to its pre-attempt counter and every contact after it is
    /// reported as cancelled without being touched.
    pub async fn dispatch_batch(
        &self,
        contact_ids: &[Uuid],
        campaign: Option<&Campaign>,
    ) -> Result<DispatchSummary> {
        let contacts = self.store.contacts_by_ids(contact_ids).await?;
        if contacts.is_empty() {
            return Err(Error::ContactNotFound(
                "no contacts found for the given ids".to_string(),
            ));
        }

        let (assistant_id, phone_number_id) = match campaign {
            Some(c) => (c.assistant_id.clone(), c.phone_number_id.clone()),
            None => (
                self.defaults.assistant_id.clone(),
                self.defaults.phone_number_id.clone(),
            ),
        };
        let campaign_id = campaign.map(|c| c.id);

        let now = Utc::now();
        let mut results = Vec::with_capacity(contacts.len());
        let mut dispatched = 0u32;
        let mut aborted_at = None;

        for (index, contact) in contacts.iter().enumerate() {
            let Some(claimed) = self.store.begin_attempt(contact.id).await? else {
                tracing::info!(contact_id = %contact.id, status = %contact.status, "Contact not dialable, skipping");
                results.push(CallResult::failure(contact.id, "Contact is not in a callable status"));
                continue;
            };

            let number = match outdial_core::format_phone(&claimed.phone) {
                Ok(number) => number,
                Err(e) => {
                    tracing::warn!(contact_id = %claimed.id, phone = %claimed.phone, "Invalid phone number: {e}");
                    self.store
                        .rollback_attempt(claimed.id, claimed.call_count - 1)
                        .await?;
                    results.push(CallResult::failure(claimed.id, e.to_string()));
                    continue;
                }
            };

            // First call fires immediately; the rest are future-dated.
            let scheduled_at = if dispatched == 0 {
                None
            } else {
                let offset = chrono::Duration::from_std(self.defaults.stagger * dispatched)
                    .unwrap_or_else(|_| chrono::Duration::zero());
                Some(now + offset)
            };

            let request = CreateCallRequest {
                assistant_id: assistant_id.clone(),
                phone_number_id: phone_number_id.clone(),
                customer_number: number,
                variables: CallVariables::from_contact(&claimed),
                scheduled_at,
            };

            match self.gateway.create_call(&request).await {
                Ok(response) => {
                    self.store
                        .insert_call_log(claimed.id, campaign_id, &response.id)
                        .await?;
                    tracing::info!(contact_id = %claimed.id, vapi_call_id = %response.id, "Call dispatched");
                    results.push(CallResult {
                        id: claimed.id,
                        success: true,
                        error: None,
                        vapi_call_id: Some(response.id),
                        scheduled_at: scheduled_at.map(|t| t.to_rfc3339()),
                    });
                    dispatched += 1;
                }
                Err(e) => {
                    tracing::error!(contact_id = %claimed.id, "Call creation failed: {e}");
                    self.store
                        .rollback_attempt(claimed.id, claimed.call_count - 1)
                        .await?;

                    let notifier = Arc::clone(&self.notifier);
                    let error_text = e.to_string();
                    let context = json!({
                        "contactId": claimed.id,
                        "phone": claimed.phone,
                        "campaignId": campaign_id,
                    });
                    tokio::spawn(async move {
                        notifier.notify_call_error(&error_text, context).await;
                    });

                    results.push(CallResult::failure(claimed.id, e.to_string()));
                    aborted_at = Some(index + 1);
                    break;
                }
            }
        }

        // Contacts never reached because the batch aborted.
        if let Some(from) = aborted_at {
            for contact in &contacts[from..] {
                results.push(CallResult::failure(contact.id, "cancelled"));
            }
        }

        let failed = results.iter().filter(|r| !r.success).count();
        Ok(DispatchSummary {
            success: failed == 0,
            message: format!("{dispatched} calls initiated, {failed} failed"),
            results,
        })
    }
}
