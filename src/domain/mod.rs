//! Shared entity types (spec.md §3). Tenant, CaseFile, Binnacle,
//! Notification, and FileAttachment tables are shared with a sibling
//! consumer service; Snapshot, ChangeLogEntry, and JobLogEntry are owned
//! here. All are `sqlx::FromRow` structs, following the teacher's
//! `db/scrape_jobs.rs` style rather than the Diesel models found elsewhere
//! in the retrieval pack (the two are inconsistent; sqlx is what the
//! Cargo.toml actually declares).

pub mod binnacle;
pub mod case_file;
pub mod change_log;
pub mod job_log;
pub mod notification;
pub mod snapshot;
pub mod tenant;

pub use binnacle::{Binnacle, BinnacleTypeTag};
pub use case_file::CaseFile;
pub use change_log::{ChangeLogEntry, ChangeType};
pub use job_log::{JobKind, JobLogEntry, JobLogStatus};
pub use notification::{FileAttachment, Notification};
pub use snapshot::Snapshot;
pub use tenant::{NotificationSchedule, Tenant};
