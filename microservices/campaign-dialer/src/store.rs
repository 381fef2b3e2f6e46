//! Storage seam for the dialer
//!
//! `DialerStore` is the narrow interface the dispatcher, queue processor,
//! and webhook handler share. `PgStore` backs it with the repository
//! modules; tests back it with an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outdial_core::{CallOutcome, ContactStatus};
use uuid::Uuid;

use crate::call_logs::{CallLog, CallLogRepository, CallReport};
use crate::campaigns::{Campaign, CampaignRepository};
use crate::contacts::{Contact, ContactRepository};
use crate::Result;

#[async_trait]
pub trait DialerStore: Send + Sync {
    async fn contact_by_id(&self, id: Uuid) -> Result<Option<Contact>>;
    async fn contacts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Contact>>;

    /// Guarded transition to `calling` with counter increment; `None` means
    /// the contact was not dialable.
    async fn begin_attempt(&self, id: Uuid) -> Result<Option<Contact>>;

    /// Gateway failure in a batch: restore the pre-attempt counter.
    async fn rollback_attempt(&self, id: Uuid, previous_count: i32) -> Result<()>;

    /// Gateway failure in the queue: keep the increment, schedule the retry.
    async fn schedule_retry(&self, id: Uuid, next_attempt_at: DateTime<Utc>) -> Result<()>;

    /// Terminal status + outcome from the webhook handler.
    async fn finalize_contact(
        &self,
        id: Uuid,
        status: ContactStatus,
        outcome: CallOutcome,
    ) -> Result<()>;

    async fn eligible_contacts(
        &self,
        campaign_id: Uuid,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<Contact>>;

    async fn campaign_by_id(&self, id: Uuid) -> Result<Option<Campaign>>;
    async fn active_campaigns(&self) -> Result<Vec<Campaign>>;

    async fn insert_call_log(
        &self,
        contact_id: Uuid,
        campaign_id: Option<Uuid>,
        vapi_call_id: &str,
    ) -> Result<()>;
    async fn call_log_by_vapi_id(&self, vapi_call_id: &str) -> Result<Option<CallLog>>;
    async fn complete_call_log(&self, id: Uuid, report: &CallReport) -> Result<()>;
}

/// PostgreSQL-backed store.
pub struct PgStore {
    db: outdial_db::DbPool,
}

impl PgStore {
    pub fn new(db: outdial_db::DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DialerStore for PgStore {
    async fn contact_by_id(&self, id: Uuid) -> Result<Option<Contact>> {
        ContactRepository::new(&self.db).find_by_id(id).await
    }

    async fn contacts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Contact>> {
        ContactRepository::new(&self.db).find_by_ids(ids).await
    }

    async fn begin_attempt(&self, id: Uuid) -> Result<Option<Contact>> {
        ContactRepository::new(&self.db).begin_attempt(id).await
    }

    async fn rollback_attempt(&self, id: Uuid, previous_count: i32) -> Result<()> {
        ContactRepository::new(&self.db)
            .rollback_attempt(id, previous_count)
            .await
    }

    async fn schedule_retry(&self, id: Uuid, next_attempt_at: DateTime<Utc>) -> Result<()> {
        ContactRepository::new(&self.db)
            .schedule_retry(id, next_attempt_at)
            .await
    }

    async fn finalize_contact(
        &self,
        id: Uuid,
        status: ContactStatus,
        outcome: CallOutcome,
    ) -> Result<()> {
        ContactRepository::new(&self.db)
            .finalize(id, status, outcome)
            .await
    }

    async fn eligible_contacts(
        &self,
        campaign_id: Uuid,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<Contact>> {
        ContactRepository::new(&self.db)
            .eligible_for_campaign(campaign_id, max_attempts, limit)
            .await
    }

    async fn campaign_by_id(&self, id: Uuid) -> Result<Option<Campaign>> {
        CampaignRepository::new(&self.db).find_by_id(id).await
    }

    async fn active_campaigns(&self) -> Result<Vec<Campaign>> {
        CampaignRepository::new(&self.db).find_active().await
    }

    async fn insert_call_log(
        &self,
        contact_id: Uuid,
        campaign_id: Option<Uuid>,
        vapi_call_id: &str,
    ) -> Result<()> {
        CallLogRepository::new(&self.db)
            .insert_initiated(contact_id, campaign_id, vapi_call_id)
            .await?;
        Ok(())
    }

    async fn call_log_by_vapi_id(&self, vapi_call_id: &str) -> Result<Option<CallLog>> {
        CallLogRepository::new(&self.db)
            .find_by_vapi_id(vapi_call_id)
            .await
    }

    async fn complete_call_log(&self, id: Uuid, report: &CallReport) -> Result<()> {
        CallLogRepository::new(&self.db).complete(id, report).await
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::testing::contact;

    #[test]
    fn test_begin_attempt_guards_status() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let c = contact("5551234567", ContactStatus::Pending);
            store.add_contact(c.clone());

            let first = store.begin_attempt(c.id).await.unwrap();
            assert!(first.is_some());
            assert_eq!(first.as_ref().map(|c| c.call_count), Some(1));

            // Already calling: a concurrent claim loses.
            let second = store.begin_attempt(c.id).await.unwrap();
            assert!(second.is_none());
            assert_eq!(store.contact(c.id).call_count, 1);
        });
    }

    #[test]
    fn test_begin_attempt_unknown_contact() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            assert!(store.begin_attempt(Uuid::new_v4()).await.unwrap().is_none());
        });
    }
}
