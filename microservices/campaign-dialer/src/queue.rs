//! Campaign queue processor
//!
//! Long-lived loop that walks active campaigns and dials their eligible
//! contacts at the campaign's pace. Unlike batch dispatch, a failed attempt
//! here counts against the contact: the increment stays and the retry is
//! pushed out by the campaign's delay, so a contact converges to
//! `exhausted` instead of being re-dialed forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use crate::campaigns::Campaign;
use crate::notify::Notifier;
use crate::store::DialerStore;
use crate::vapi::{CallGateway, CallVariables, CreateCallRequest};
use crate::Result;

pub struct QueueProcessor {
    store: Arc<dyn DialerStore>,
    gateway: Arc<dyn CallGateway>,
    notifier: Arc<Notifier>,
    poll_interval: Duration,
}

impl QueueProcessor {
    pub fn new(
        store: Arc<dyn DialerStore>,
        gateway: Arc<dyn CallGateway>,
        notifier: Arc<Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            poll_interval,
        }
    }

    /// Poll forever. A failed pass is logged and the loop keeps going.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.poll_interval.as_secs(), "Queue processor started");
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_pass().await {
                tracing::error!("Queue pass failed: {e}");
            }
        }
    }

    /// One pass over all active campaigns. Campaign failures are contained.
    pub async fn run_pass(&self) -> Result<()> {
        let campaigns = self.store.active_campaigns().await?;
        for campaign in &campaigns {
            if let Err(e) = self.process_campaign(campaign).await {
                tracing::error!(campaign_id = %campaign.id, "Campaign pass failed: {e}");
            }
        }
        Ok(())
    }

    async fn process_campaign(&self, campaign: &Campaign) -> Result<()> {
        let now = Utc::now();
        if !campaign.is_within_calling_window(now) {
            tracing::debug!(campaign_id = %campaign.id, "Outside calling window");
            return Ok(());
        }

        let contacts = self
            .store
            .eligible_contacts(campaign.id, campaign.max_attempts, campaign.calls_per_minute as i64)
            .await?;
        if contacts.is_empty() {
            return Ok(());
        }

        tracing::info!(
            campaign_id = %campaign.id,
            contacts = contacts.len(),
            "Dialing eligible contacts"
        );

        let retry_delay = chrono::Duration::minutes(campaign.retry_delay_minutes as i64);

        for contact in &contacts {
            let Some(claimed) = self.store.begin_attempt(contact.id).await? else {
                continue;
            };

            let number = match outdial_core::format_phone(&claimed.phone) {
                Ok(number) => number,
                Err(e) => {
                    tracing::warn!(contact_id = %claimed.id, phone = %claimed.phone, "Invalid phone number: {e}");
                    self.store
                        .schedule_retry(claimed.id, Utc::now() + retry_delay)
                        .await?;
                    continue;
                }
            };

            let request = CreateCallRequest {
                assistant_id: campaign.assistant_id.clone(),
                phone_number_id: campaign.phone_number_id.clone(),
                customer_number: number,
                variables: CallVariables::from_contact(&claimed),
                scheduled_at: None,
            };

            match self.gateway.create_call(&request).await {
                Ok(response) => {
                    self.store
                        .insert_call_log(claimed.id, Some(campaign.id), &response.id)
                        .await?;
                    tracing::info!(contact_id = %claimed.id, vapi_call_id = %response.id, "Call dispatched");
                }
                Err(e) => {
                    tracing::error!(contact_id = %claimed.id, "Call creation failed: {e}");
                    // The attempt counts: keep the increment, retry later.
                    self.store
                        .schedule_retry(claimed.id, Utc::now() + retry_delay)
                        .await?;

                    let notifier = Arc::clone(&self.notifier);
                    let error_text = e.to_string();
                    let context = json!({
                        "contactId": claimed.id,
                        "campaignId": campaign.id,
                        "phone": claimed.phone,
                    });
                    tokio::spawn(async move {
                        notifier.notify_call_error(&error_text, context).await;
                    });
                }
            }
        }

        Ok(())
    }
}
