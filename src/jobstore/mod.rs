//! JobStore (spec.md §4.2): the durable three-lane job queue sitting
//! between the Scheduler/HTTP ingress and the Worker pool.

pub mod model;
pub mod rate_limiter;
pub mod store;

pub use model::{backoff_delay, dedup_key, Job, JobPayload, JobState, Lane};
pub use rate_limiter::{JobRateLimiter, SharedJobRateLimiter};
pub use store::{FailOutcome, JobStore};
