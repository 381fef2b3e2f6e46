//! Contact management module
//!
//! Holds the contact model and its repository. Contact state transitions
//! are guarded: a dispatch attempt only starts from a dialable status, so a
//! concurrent dispatch of the same contact loses the race and is skipped.

use chrono::{DateTime, Utc};
use outdial_core::{CallOutcome, ContactStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A dialing target with identity fields and calling state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub status: ContactStatus,
    pub outcome: Option<String>,
    /// Increments once per attempted dispatch, never per retry-scheduling.
    pub call_count: i32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Statuses a dispatch attempt may start from, as SQL parameters.
const DIALABLE_STATUSES: [&str; 4] = ["pending", "failed", "no_answer", "voicemail"];

/// Contact repository for database operations
pub struct ContactRepository<'a> {
    db: &'a outdial_db::DbPool,
}

impl<'a> ContactRepository<'a> {
    pub fn new(db: &'a outdial_db::DbPool) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let row = client
            .query_opt("SELECT * FROM contacts WHERE id = $1", &[&id])
            .await?;

        Ok(row.map(|r| row_to_contact(&r)))
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Contact>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let id_list = ids.to_vec();
        let rows = client
            .query(
                "SELECT * FROM contacts WHERE id = ANY($1) ORDER BY created_at ASC",
                &[&id_list],
            )
            .await?;

        Ok(rows.iter().map(row_to_contact).collect())
    }

    /// Start a dispatch attempt: conditionally move the contact to `calling`,
    /// increment the attempt counter, and stamp `last_attempt_at`.
    ///
    /// Returns the refreshed contact, or `None` if the contact was not in a
    /// dialable status (already calling, answered, exhausted, dnc, or won by
    /// a concurrent dispatch).
    pub async fn begin_attempt(&self, id: Uuid) -> Result<Option<Contact>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let statuses: Vec<String> = DIALABLE_STATUSES.iter().map(|s| s.to_string()).collect();
        let row = client
            .query_opt(
                r#"
                UPDATE contacts SET
                    status = 'calling',
                    call_count = call_count + 1,
                    last_attempt_at = NOW()
                WHERE id = $1 AND status = ANY($2)
                RETURNING *
                "#,
                &[&id, &statuses],
            )
            .await?;

        Ok(row.map(|r| row_to_contact(&r)))
    }

    /// Roll back a failed gateway attempt: restore the pre-attempt counter
    /// and mark the contact failed.
    pub async fn rollback_attempt(&self, id: Uuid, previous_count: i32) -> Result<()> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        client
            .execute(
                "UPDATE contacts SET status = 'failed', call_count = $2 WHERE id = $1",
                &[&id, &previous_count],
            )
            .await?;

        Ok(())
    }

    /// Mark failed and schedule the next attempt (queue variant — the
    /// attempt counter keeps its increment).
    pub async fn schedule_retry(&self, id: Uuid, next_attempt_at: DateTime<Utc>) -> Result<()> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        client
            .execute(
                "UPDATE contacts SET status = 'failed', next_attempt_at = $2 WHERE id = $1",
                &[&id, &next_attempt_at],
            )
            .await?;

        Ok(())
    }

    /// Record the terminal result of an attempt. `outcome` always keeps the
    /// mapped outcome even when `status` becomes `exhausted`.
    pub async fn finalize(
        &self,
        id: Uuid,
        status: ContactStatus,
        outcome: CallOutcome,
    ) -> Result<()> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        client
            .execute(
                "UPDATE contacts SET status = $2, outcome = $3 WHERE id = $1",
                &[&id, &status.as_str(), &outcome.as_str()],
            )
            .await?;

        Ok(())
    }

    /// Contacts ready to dial for a campaign pass: pending or failed, under
    /// the attempt ceiling, due now, oldest due first, capped by the
    /// campaign's per-minute pacing budget.
    pub async fn eligible_for_campaign(
        &self,
        campaign_id: Uuid,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<Contact>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let rows = client
            .query(
                r#"
                SELECT * FROM contacts
                WHERE campaign_id = $1
                  AND status IN ('pending', 'failed')
                  AND call_count < $2
                  AND next_attempt_at <= NOW()
                ORDER BY next_attempt_at ASC
                LIMIT $3
                "#,
                &[&campaign_id, &max_attempts, &limit],
            )
            .await?;

        Ok(rows.iter().map(row_to_contact).collect())
    }
}

pub(crate) fn row_to_contact(row: &tokio_postgres::Row) -> Contact {
    Contact {
        id: row.get("id"),
        campaign_id: row.get("campaign_id"),
        phone: row.get("phone"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        company: row.get("company"),
        location: row.get("location"),
        industry: row.get("industry"),
        status: row
            .get::<_, String>("status")
            .parse()
            .unwrap_or(ContactStatus::Pending),
        outcome: row.get("outcome"),
        call_count: row.get("call_count"),
        last_attempt_at: row.get("last_attempt_at"),
        next_attempt_at: row.get("next_attempt_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: Option<&str>, last: Option<&str>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            campaign_id: None,
            phone: "555-123-4567".to_string(),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            company: None,
            location: None,
            industry: None,
            status: ContactStatus::Pending,
            outcome: None,
            call_count: 0,
            last_attempt_at: None,
            next_attempt_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(contact(Some("Ada"), Some("Lovelace")).display_name(), "Ada Lovelace");
        assert_eq!(contact(Some("Ada"), None).display_name(), "Ada");
        assert_eq!(contact(None, Some("Lovelace")).display_name(), "Lovelace");
        assert_eq!(contact(None, None).display_name(), "unknown");
    }
}
