//! Adaptive scheduling rule (spec.md §4.1): decides whether a `CaseFile`
//! is due for a MONITOR scrape. Reworked from the teacher's
//! `scraper::adaptive` change-ratio tiers into the spec's threshold rule
//! keyed on `createdAt`/`lastScrapedAt`/`lastChangedAt`, but kept as the
//! same shape: a pure function over a small stats struct, independently
//! unit-tested the way `compute_base_interval` is.

use chrono::{DateTime, Utc};

use crate::domain::Snapshot;

/// The subset of CaseFile/Snapshot state the rule needs.
#[derive(Debug, Clone)]
pub struct SchedulingFacts {
    pub created_at: DateTime<Utc>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub last_changed_at: Option<DateTime<Utc>>,
    pub has_snapshot: bool,
}

impl SchedulingFacts {
    pub fn from_case_file(
        created_at: DateTime<Utc>,
        last_scraped_at: Option<DateTime<Utc>>,
        snapshot: Option<&Snapshot>,
    ) -> Self {
        Self {
            created_at,
            last_scraped_at,
            last_changed_at: snapshot.and_then(|s| s.last_changed_at),
            has_snapshot: snapshot.is_some(),
        }
    }
}

fn days_since(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    (now - then).num_days()
}

/// Whether this CaseFile is due for a MONITOR scrape right now (spec.md
/// §4.1's adaptive frequency rule, evaluated top-to-bottom):
///
/// - `daysSince(createdAt) < 7` (new case files scrape aggressively)
/// - no Snapshot exists yet
/// - `lastChangedAt` exists and `daysSince(lastChangedAt) < 7` (recently
///   active)
/// - `daysSince(lastChangedAt) > 90 && daysSince(lastScrapedAt) >= 7`
///   (long-dormant, infrequent checks)
/// - `daysSince(lastChangedAt) > 30 && daysSince(lastScrapedAt) >= 3`
///   (moderately dormant)
/// - otherwise `daysSince(lastScrapedAt) >= 1` (default daily cadence)
pub fn is_due(facts: &SchedulingFacts, now: DateTime<Utc>) -> bool {
    if days_since(now, facts.created_at) < 7 {
        return true;
    }
    if !facts.has_snapshot {
        return true;
    }

    let scraped_days = facts.last_scraped_at.map(|t| days_since(now, t));

    if let Some(changed_at) = facts.last_changed_at {
        let changed_days = days_since(now, changed_at);
        if changed_days < 7 {
            return true;
        }
        if changed_days > 90 && scraped_days.is_none_or(|d| d >= 7) {
            return true;
        }
        if changed_days > 30 && scraped_days.is_none_or(|d| d >= 3) {
            return true;
        }
    }

    scraped_days.is_none_or(|d| d >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn facts(created_days_ago: i64, scraped_days_ago: Option<i64>, changed_days_ago: Option<i64>, has_snapshot: bool) -> (SchedulingFacts, DateTime<Utc>) {
        let now = Utc::now();
        (
            SchedulingFacts {
                created_at: now - Duration::days(created_days_ago),
                last_scraped_at: scraped_days_ago.map(|d| now - Duration::days(d)),
                last_changed_at: changed_days_ago.map(|d| now - Duration::days(d)),
                has_snapshot,
            },
            now,
        )
    }

    #[test]
    fn new_case_file_always_due() {
        let (f, now) = facts(1, Some(0), Some(0), true);
        assert!(is_due(&f, now));
    }

    #[test]
    fn missing_snapshot_always_due() {
        let (f, now) = facts(100, None, None, false);
        assert!(is_due(&f, now));
    }

    #[test]
    fn recently_changed_stays_due() {
        let (f, now) = facts(100, Some(5), Some(3), true);
        assert!(is_due(&f, now));
    }

    #[test]
    fn long_dormant_needs_week_gap() {
        let (f, now) = facts(200, Some(2), Some(120), true);
        assert!(!is_due(&f, now));

        let (f2, now2) = facts(200, Some(10), Some(120), true);
        assert!(is_due(&f2, now2));
    }

    #[test]
    fn moderately_dormant_needs_three_day_gap() {
        let (f, now) = facts(200, Some(1), Some(45), true);
        assert!(!is_due(&f, now));

        let (f2, now2) = facts(200, Some(4), Some(45), true);
        assert!(is_due(&f2, now2));
    }

    #[test]
    fn default_cadence_is_daily() {
        let (f, now) = facts(200, Some(0), Some(10), true);
        assert!(!is_due(&f, now));

        let (f2, now2) = facts(200, Some(2), Some(10), true);
        assert!(is_due(&f2, now2));
    }
}
