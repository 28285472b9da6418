//! A single configured IANA timezone used for every "now" stamp, dedup-key
//! date, and scheduling decision in the service.
//!
//! Mirrors the teacher's use of `chrono_tz::US::Central` in
//! `scraper/adaptive.rs`, generalized to a runtime-configured zone instead
//! of a hardcoded one since this service's portal spans multiple Tenants in
//! one timezone rather than one university in one fixed zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Wall-clock source for the service. A trait so tests can fix `now()`
/// without sleeping or faking the system clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn tz(&self) -> Tz;

    /// `now()` projected into the configured timezone.
    fn local_now(&self) -> DateTime<Tz> {
        self.now().with_timezone(&self.tz())
    }

    /// Calendar date in the configured timezone, formatted `YYYYMMDD`, used
    /// to build the MONITOR/INITIAL dedup keys.
    fn today_compact(&self) -> String {
        self.local_now().format("%Y%m%d").to_string()
    }
}

#[derive(Clone)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn tz(&self) -> Tz {
        self.tz
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// A clock that returns a fixed, settable instant. Used by unit tests
    /// that assert on adaptive-scheduling or backoff-timing decisions
    /// without depending on wall-clock time.
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
        tz: Tz,
    }

    impl FixedClock {
        pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
            Self {
                now: Mutex::new(now),
                tz,
            }
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn tz(&self) -> Tz {
            self.tz
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FixedClock;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_compact_uses_configured_zone_not_utc() {
        // 01:30 UTC on 2026-01-02 is still 2026-01-01 in America/Lima (UTC-5).
        let instant = Utc.with_ymd_and_hms(2026, 1, 2, 1, 30, 0).unwrap();
        let clock = FixedClock::new(instant, chrono_tz::America::Lima);
        assert_eq!(clock.today_compact(), "20260101");
    }
}
