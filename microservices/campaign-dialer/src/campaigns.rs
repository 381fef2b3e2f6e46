//! Campaign management module
//!
//! Campaign model, repository, and the local-time calling-window check.

use chrono::{DateTime, FixedOffset, Utc};
use outdial_core::CampaignStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A named calling effort with pacing, window, and retry configuration.
/// Read-only to the dispatcher; immutable during a dispatch pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub assistant_id: String,
    pub phone_number_id: String,
    pub status: CampaignStatus,
    pub calls_per_minute: i32,
    /// Window bounds as local wall-clock "HH:MM", inclusive.
    pub call_window_start: String,
    pub call_window_end: String,
    /// Fixed UTC offset, e.g. "-06:00". Empty, "Z", or "UTC" mean UTC.
    pub timezone: String,
    pub max_attempts: i32,
    pub retry_delay_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether `now` falls inside the campaign's calling window, compared as
    /// wall-clock minutes in the campaign's timezone, bounds inclusive.
    ///
    /// Unparseable window bounds close the window (the campaign is skipped)
    /// rather than opening it.
    pub fn is_within_calling_window(&self, now: DateTime<Utc>) -> bool {
        let (Some(start), Some(end)) = (
            parse_hhmm(&self.call_window_start),
            parse_hhmm(&self.call_window_end),
        ) else {
            tracing::warn!(
                campaign_id = %self.id,
                start = %self.call_window_start,
                end = %self.call_window_end,
                "Unparseable calling window, skipping campaign"
            );
            return false;
        };

        let offset = parse_offset(&self.timezone).unwrap_or_else(|| {
            tracing::warn!(
                campaign_id = %self.id,
                timezone = %self.timezone,
                "Unparseable timezone, falling back to UTC"
            );
            FixedOffset::east_opt(0).unwrap()
        });

        let local = now.with_timezone(&offset);
        let current = wall_clock_minutes(&local);

        current >= start && current <= end
    }
}

/// Parse "HH:MM" into minutes since midnight.
fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Parse a fixed UTC offset string. Empty, "Z", and "UTC" map to UTC.
fn parse_offset(value: &str) -> Option<FixedOffset> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc")
    {
        return FixedOffset::east_opt(0);
    }
    trimmed.parse().ok()
}

fn wall_clock_minutes(local: &DateTime<FixedOffset>) -> u32 {
    use chrono::Timelike;
    local.hour() * 60 + local.minute()
}

/// Campaign repository for database operations
pub struct CampaignRepository<'a> {
    db: &'a outdial_db::DbPool,
}

impl<'a> CampaignRepository<'a> {
    pub fn new(db: &'a outdial_db::DbPool) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let row = client
            .query_opt("SELECT * FROM campaigns WHERE id = $1", &[&id])
            .await?;

        Ok(row.map(|r| row_to_campaign(&r)))
    }

    pub async fn find_active(&self) -> Result<Vec<Campaign>> {
        let client = self.db.get().await.map_err(|e| Error::Pool(e.to_string()))?;

        let rows = client
            .query(
                "SELECT * FROM campaigns WHERE status = 'active' ORDER BY created_at ASC",
                &[],
            )
            .await?;

        Ok(rows.iter().map(row_to_campaign).collect())
    }
}

pub(crate) fn row_to_campaign(row: &tokio_postgres::Row) -> Campaign {
    Campaign {
        id: row.get("id"),
        name: row.get("name"),
        assistant_id: row.get("assistant_id"),
        phone_number_id: row.get("phone_number_id"),
        status: row
            .get::<_, String>("status")
            .parse()
            .unwrap_or(CampaignStatus::Paused),
        calls_per_minute: row.get("calls_per_minute"),
        call_window_start: row.get("call_window_start"),
        call_window_end: row.get("call_window_end"),
        timezone: row.get("timezone"),
        max_attempts: row.get("max_attempts"),
        retry_delay_minutes: row.get("retry_delay_minutes"),
        created_at: row.get("created_at"),
    }
}
