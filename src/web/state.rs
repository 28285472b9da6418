//! Shared state for the inbound control API router (spec.md §6).

use std::sync::Arc;
use std::time::Instant;

use crate::browser::BrowserPool;
use crate::clock::Clock;
use crate::jobstore::JobStore;
use crate::repository::Repository;
use crate::status::ServiceStatusRegistry;

#[derive(Clone)]
pub struct WebState {
    pub repository: Arc<Repository>,
    pub job_store: Arc<JobStore>,
    pub browser_pool: Arc<BrowserPool>,
    pub clock: Arc<dyn Clock>,
    pub service_statuses: ServiceStatusRegistry,
    pub service_secret: String,
    pub started_at: Instant,
}
