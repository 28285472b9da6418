use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `(binnacle, code)` is the uniqueness key, but the Worker never dedups on
/// insert — the Portal is the source of truth and occasional duplicates are
/// accepted (spec.md §4.6 step 10b).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub binnacle_id: Uuid,
    pub code: String,
    pub addressee: Option<String>,
    pub ship_date: Option<DateTime<Utc>>,
    pub attachments: Option<serde_json::Value>,
    pub delivery_method: Option<String>,
    pub status_date_1: Option<DateTime<Utc>>,
    pub status_date_2: Option<DateTime<Utc>>,
    pub status_date_3: Option<DateTime<Utc>>,
    pub status_date_4: Option<DateTime<Utc>>,
    pub status_date_5: Option<DateTime<Utc>>,
    pub status_date_6: Option<DateTime<Utc>>,
}

/// `(binnacle, originalName)` is unique. Recorded only after a successful
/// download + upload pair; a download failure logs a warning and the job
/// continues (spec.md §4.6 step 10c, §7 `ObjectStoreFailure`).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct FileAttachment {
    pub id: Uuid,
    pub binnacle_id: Uuid,
    pub original_name: String,
    pub size: i64,
    pub object_store_key: String,
}
