//! Call log module
//!
//! One append-only row per dial attempt. A row is written with status
//! `initiated` at dispatch time and completed exactly once by the webhook
//! handler; completion is idempotent (replaying a report converges to the
//! same row).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// One record per dial attempt, enriched post-call by the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub vapi_call_id: String,
    pub status: String,
    pub ended_reason: Option<String>,
    pub duration_seconds: Option<i32>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub cost: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Final result of an attempt, extracted from the provider's end-of-call
/// report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallReport {
    pub ended_reason: String,
    pub duration_seconds: i32,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub cost: Option<f64>,
}

/// Call log repository for database operations
pub struct CallLogRepository<'a> {
    db: &'a outdial_db::DbPool,
}

impl<'a> CallLogRepository<'a> {
    pub fn new(db: &'a outdial_db::DbPool) -> Self {
        Self { db }
    }

    /// Insert the `initiated` row for a freshly dispatched attempt.
    pub async fn insert_initiated(
        &self,
        contact_id: Uuid,
        campaign_id: Option<Uuid>,
        vapi_call_id: &str,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        client
            .execute(
                r#"
                INSERT INTO call_logs (id, contact_id, campaign_id, vapi_call_id, status, created_at)
                VALUES ($1, $2, $3, $4, 'initiated', NOW())
                "#,
                &[&id, &contact_id, &campaign_id, &vapi_call_id],
            )
            .await?;

        Ok(id)
    }

    pub async fn find_by_vapi_id(&self, vapi_call_id: &str) -> Result<Option<CallLog>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let row = client
            .query_opt(
                "SELECT * FROM call_logs WHERE vapi_call_id = $1",
                &[&vapi_call_id],
            )
            .await?;

        Ok(row.map(|r| row_to_call_log(&r)))
    }

    /// Complete the attempt with the final report. Safe to replay.
    pub async fn complete(&self, id: Uuid, report: &CallReport) -> Result<()> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        client
            .execute(
                r#"
                UPDATE call_logs SET
                    status = $2,
                    ended_reason = $2,
                    duration_seconds = $3,
                    transcript = COALESCE($4, transcript),
                    recording_url = COALESCE($5, recording_url),
                    cost = COALESCE($6, cost)
                WHERE id = $1
                "#,
                &[
                    &id,
                    &report.ended_reason,
                    &report.duration_seconds,
                    &report.transcript,
                    &report.recording_url,
                    &report.cost,
                ],
            )
            .await?;

        Ok(())
    }
}

pub(crate) fn row_to_call_log(row: &tokio_postgres::Row) -> CallLog {
    CallLog {
        id: row.get("id"),
        contact_id: row.get("contact_id"),
        campaign_id: row.get("campaign_id"),
        vapi_call_id: row.get("vapi_call_id"),
        status: row.get("status"),
        ended_reason: row.get("ended_reason"),
        duration_seconds: row.get("duration_seconds"),
        transcript: row.get("transcript"),
        recording_url: row.get("recording_url"),
        cost: row.get("cost"),
        created_at: row.get("created_at"),
    }
}
