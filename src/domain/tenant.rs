use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant-bank subscription. `scrapeEnabled` gates whether any of its
/// CaseFiles are ever selected by the Scheduler, regardless of the
/// CaseFile's own flag.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub scrape_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// `(Tenant, logicKey, times, enabled)`. Only rows with
/// `logic_key = "portal-monitoring"` drive the scraping Scheduler; other
/// logic keys belong to the sibling notification service and are ignored
/// here.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct NotificationSchedule {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub logic_key: String,
    /// Wall-clock times of day, `HH:MM`, in the configured timezone.
    pub times: Vec<String>,
    pub enabled: bool,
}

pub const PORTAL_MONITORING_LOGIC_KEY: &str = "portal-monitoring";

impl NotificationSchedule {
    pub fn drives_portal_monitoring(&self) -> bool {
        self.enabled && self.logic_key == PORTAL_MONITORING_LOGIC_KEY
    }

    /// Nearest upcoming notification hour today, or `23:59` if the schedule
    /// has no times or all of today's times have passed (spec.md §4.3's
    /// default).
    pub fn nearest_upcoming_hour(&self, current_hhmm: &str) -> String {
        nearest_upcoming_hour(current_hhmm, &self.times)
    }
}

/// Free-function form of [`NotificationSchedule::nearest_upcoming_hour`]
/// for callers (e.g. the Scheduler) that only have the flattened
/// `times` list from a [`crate::repository::tenants::ScheduleWithTenant`]
/// row, not a full `NotificationSchedule`.
pub fn nearest_upcoming_hour(current_hhmm: &str, times: &[String]) -> String {
    times
        .iter()
        .filter(|t| t.as_str() > current_hhmm)
        .min()
        .cloned()
        .unwrap_or_else(|| "23:59".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(times: &[&str]) -> NotificationSchedule {
        NotificationSchedule {
            id: Uuid::nil(),
            tenant_id: Uuid::nil(),
            logic_key: PORTAL_MONITORING_LOGIC_KEY.to_string(),
            times: times.iter().map(|s| s.to_string()).collect(),
            enabled: true,
        }
    }

    #[test]
    fn falls_back_to_default_when_all_times_passed() {
        let s = schedule(&["08:00", "09:00"]);
        assert_eq!(s.nearest_upcoming_hour("10:00"), "23:59");
    }

    #[test]
    fn picks_nearest_future_time() {
        let s = schedule(&["08:00", "14:00", "20:00"]);
        assert_eq!(s.nearest_upcoming_hour("10:00"), "14:00");
    }

    #[test]
    fn ignores_non_monitoring_logic_keys() {
        let mut s = schedule(&["08:00"]);
        s.logic_key = "billing-reminder".to_string();
        assert!(!s.drives_portal_monitoring());
    }
}
