use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only from the core's side; `notified` is flipped by an external,
/// idempotent consumer reading `WHERE notified = false` (spec.md §6).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: Uuid,
    pub case_file_id: Uuid,
    pub tenant_id: Uuid,
    pub change_type: ChangeType,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "change_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    NewBinnacle,
    ModifiedBinnacle,
    RemovedBinnacle,
    NewNotification,
    NewFile,
}
