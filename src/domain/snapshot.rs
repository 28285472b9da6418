use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical, normalized representation of a CaseFile's binnacle list at
/// its most recent successful scrape, plus its content hash.
///
/// Invariant: exactly one row per CaseFile once the first scrape completes
/// (upserted, never appended). The source repo this spec distilled from
/// disagreed with itself about whether `canonical_payload` is stored as
/// JSON or a stringified JSON blob (spec.md §9 Open Questions); this
/// implementation stores it as `jsonb` and reads/writes it symmetrically as
/// `serde_json::Value`, never as a string.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Snapshot {
    pub case_file_id: Uuid,
    pub content_hash: String,
    pub binnacle_count: i32,
    pub canonical_payload: serde_json::Value,
    pub last_scraped_at: DateTime<Utc>,
    pub last_changed_at: Option<DateTime<Utc>>,
    pub scrape_count: i32,
    pub consecutive_no_change: i32,
    pub error_count: i32,
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn days_since_changed(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_changed_at.map(|t| (now - t).num_days())
    }

    pub fn days_since_scraped(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_scraped_at).num_days()
    }
}
