//! The single global token bucket gating all three lanes (spec.md §4.2,
//! §5). Grounded on the teacher's `banner::rate_limiter::BannerRateLimiter`,
//! collapsed from four per-request-type limiters to one shared bucket
//! since every lane here draws against the same Portal-facing capacity.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};

/// Shared token bucket. Default quota (spec.md §5): 10 jobs per 60s.
pub struct JobRateLimiter {
    inner: Governor<NotKeyed, InMemoryState, DefaultClock>,
}

impl JobRateLimiter {
    pub fn new(permits_per_window: u32, window: Duration) -> Self {
        let quota = Quota::with_period(window / permits_per_window.max(1))
            .expect("non-zero window/permits")
            .allow_burst(NonZeroU32::new(permits_per_window.max(1)).unwrap());
        Self {
            inner: Governor::direct(quota),
        }
    }

    pub async fn until_ready(&self) {
        self.inner.until_ready().await;
    }

    pub fn check(&self) -> bool {
        self.inner.check().is_ok()
    }
}

impl Default for JobRateLimiter {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(60))
    }
}

pub type SharedJobRateLimiter = Arc<JobRateLimiter>;
