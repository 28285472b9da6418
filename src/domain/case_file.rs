use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A judicial case being monitored on behalf of a Tenant.
///
/// Invariant: only rows with `scrape_enabled ∧ scan_valid ∧ ¬archived`, and
/// whose Tenant also has `scrape_enabled`, are ever selected by the
/// Scheduler. `scan_valid = false` is a permanent skip until an external
/// actor flips it back (set by the Worker on `InvalidCaseNumber`).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CaseFile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub external_case_number: String,
    pub party_name: String,
    pub scrape_enabled: bool,
    pub scan_valid: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub has_pending_changes: bool,
}

impl CaseFile {
    pub fn is_eligible_for_scheduling(&self, tenant_scrape_enabled: bool) -> bool {
        self.scrape_enabled && self.scan_valid && !self.archived && tenant_scrape_enabled
    }

    pub fn days_since_created(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_file() -> CaseFile {
        CaseFile {
            id: Uuid::nil(),
            tenant_id: Uuid::nil(),
            external_case_number: "00123-2024-0-1801-JR-CI-01".to_string(),
            party_name: "Acme S.A.".to_string(),
            scrape_enabled: true,
            scan_valid: true,
            archived: false,
            created_at: Utc::now(),
            last_scraped_at: None,
            has_pending_changes: false,
        }
    }

    #[test]
    fn invalid_scan_is_never_eligible() {
        let mut cf = case_file();
        cf.scan_valid = false;
        assert!(!cf.is_eligible_for_scheduling(true));
    }

    #[test]
    fn archived_is_never_eligible() {
        let mut cf = case_file();
        cf.archived = true;
        assert!(!cf.is_eligible_for_scheduling(true));
    }

    #[test]
    fn tenant_disabled_overrides_case_file_enabled() {
        let cf = case_file();
        assert!(!cf.is_eligible_for_scheduling(false));
    }

    #[test]
    fn fully_eligible_case() {
        let cf = case_file();
        assert!(cf.is_eligible_for_scheduling(true));
    }
}
