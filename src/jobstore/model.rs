//! Job record shape (spec.md §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "job_lane", rename_all = "UPPERCASE")]
pub enum Lane {
    Initial,
    Monitor,
    Priority,
}

impl Lane {
    /// Poll order: `PRIORITY` drains before `INITIAL` before `MONITOR`
    /// (spec.md §4.2 poll policy).
    pub fn poll_rank(self) -> i16 {
        match self {
            Lane::Priority => 0,
            Lane::Initial => 1,
            Lane::Monitor => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "job_state", rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Active,
    Delayed,
    Completed,
    Failed,
}

/// The payload carried by every job: enough for the Worker to run the
/// pipeline without a second Repository round-trip to resolve identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub case_file_id: Uuid,
    pub tenant_id: Uuid,
    pub case_number: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub lane: Lane,
    pub payload: serde_json::Value,
    pub priority: i16,
    pub dedup_key: String,
    pub attempt: i32,
    pub max_attempts: i32,
    pub state: JobState,
    pub deadline: Option<DateTime<Utc>>,
    pub run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn payload(&self) -> serde_json::Result<JobPayload> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Fallback defaults; `JobStore` is normally constructed with the
/// configured `max_job_attempts`/`job_backoff_base_ms` (spec.md §6).
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;
pub const DEFAULT_BACKOFF_BASE_SECS: i64 = 30;

/// Exponential backoff with ±20% jitter (spec.md §4.2, §7). `attempt` is
/// the attempt number that just failed (1-indexed); `base_secs` is the
/// configured `job_backoff_base_ms` converted to seconds.
pub fn backoff_delay(attempt: i32, jitter_unit: f64, base_secs: i64) -> chrono::Duration {
    let exp = base_secs * 2i64.pow((attempt - 1).max(0) as u32);
    let jitter = 1.0 + (jitter_unit.clamp(-1.0, 1.0) * 0.2);
    let secs = (exp as f64 * jitter).round().max(1.0) as i64;
    chrono::Duration::seconds(secs)
}

/// `initial:{caseFileId}:{YYYYMMDD}` / `monitor:{caseFileId}:{YYYYMMDD}` —
/// both dedup per calendar day so a re-triggered scheduler tick doesn't
/// double-enqueue. `priority:{caseFileId}:{unixMillis}` never dedups.
pub fn dedup_key(lane: Lane, case_file_id: Uuid, day_compact: &str, unix_millis: i64) -> String {
    match lane {
        Lane::Initial => format!("initial:{case_file_id}:{day_compact}"),
        Lane::Monitor => format!("monitor:{case_file_id}:{day_compact}"),
        Lane::Priority => format!("priority:{case_file_id}:{unix_millis}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_rank_orders_priority_then_initial_then_monitor() {
        assert!(Lane::Priority.poll_rank() < Lane::Initial.poll_rank());
        assert!(Lane::Initial.poll_rank() < Lane::Monitor.poll_rank());
    }

    #[test]
    fn backoff_doubles_each_attempt_before_jitter() {
        assert_eq!(backoff_delay(1, 0.0, DEFAULT_BACKOFF_BASE_SECS).num_seconds(), 30);
        assert_eq!(backoff_delay(2, 0.0, DEFAULT_BACKOFF_BASE_SECS).num_seconds(), 60);
        assert_eq!(backoff_delay(3, 0.0, DEFAULT_BACKOFF_BASE_SECS).num_seconds(), 120);
    }

    #[test]
    fn backoff_jitter_stays_within_20_percent() {
        let base = backoff_delay(2, 0.0, DEFAULT_BACKOFF_BASE_SECS).num_seconds();
        let high = backoff_delay(2, 1.0, DEFAULT_BACKOFF_BASE_SECS).num_seconds();
        let low = backoff_delay(2, -1.0, DEFAULT_BACKOFF_BASE_SECS).num_seconds();
        assert_eq!(high, (base as f64 * 1.2).round() as i64);
        assert_eq!(low, (base as f64 * 0.8).round() as i64);
    }

    #[test]
    fn priority_dedup_key_never_collides_across_calls() {
        let id = Uuid::nil();
        let a = dedup_key(Lane::Priority, id, "20260101", 1000);
        let b = dedup_key(Lane::Priority, id, "20260101", 1001);
        assert_ne!(a, b);
    }

    #[test]
    fn monitor_dedup_key_collides_within_same_day() {
        let id = Uuid::nil();
        let a = dedup_key(Lane::Monitor, id, "20260101", 1000);
        let b = dedup_key(Lane::Monitor, id, "20260101", 9999);
        assert_eq!(a, b);
    }
}
