use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorKind;

/// One row per job attempt, written at the start and end of Worker
/// processing (spec.md §4.6 steps 1, 11, 12).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub id: Uuid,
    pub case_file_id: Uuid,
    pub tenant_id: Uuid,
    pub job_kind: JobKind,
    pub status: JobLogStatus,
    pub attempt: i32,
    pub duration_ms: Option<i32>,
    pub binnacles_found: Option<i32>,
    pub changes_detected: Option<i32>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub worker_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "job_kind", rename_all = "UPPERCASE")]
pub enum JobKind {
    Initial,
    Monitor,
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "job_log_status", rename_all = "UPPERCASE")]
pub enum JobLogStatus {
    Started,
    Completed,
    Failed,
    Retrying,
}

impl JobLogStatus {
    pub fn terminal_for(retryable: bool, attempts_remain: bool) -> Self {
        if retryable && attempts_remain {
            JobLogStatus::Retrying
        } else {
            JobLogStatus::Failed
        }
    }
}

impl From<ErrorKind> for &'static str {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str()
    }
}
