use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::CaseFile;
use crate::error::Result;
use crate::repository::Repository;

pub struct CaseFileOps<'a> {
    repo: &'a Repository,
}

impl<'a> CaseFileOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    pub async fn find(&self, case_file_id: Uuid) -> Result<Option<CaseFile>> {
        let cf = sqlx::query_as::<_, CaseFile>("SELECT * FROM case_files WHERE id = $1")
            .bind(case_file_id)
            .fetch_optional(self.repo.pool())
            .await?;
        Ok(cf)
    }

    /// Eligible CaseFiles for a Tenant: `scrape_enabled ∧ scan_valid ∧
    /// ¬archived` (spec.md §3, §4.1 step 2). The caller has already
    /// verified the Tenant itself is `scrape_enabled`.
    pub async fn eligible_for_tenant(&self, tenant_id: Uuid) -> Result<Vec<CaseFile>> {
        let rows = sqlx::query_as::<_, CaseFile>(
            "SELECT * FROM case_files \
             WHERE tenant_id = $1 AND scrape_enabled = true AND scan_valid = true AND archived = false",
        )
        .bind(tenant_id)
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows)
    }

    pub async fn mark_scanned(
        &self,
        case_file_id: Uuid,
        now: DateTime<Utc>,
        has_pending_changes: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE case_files \
             SET last_scraped_at = $2, has_pending_changes = $3 \
             WHERE id = $1",
        )
        .bind(case_file_id)
        .bind(now)
        .bind(has_pending_changes)
        .execute(self.repo.pool())
        .await?;
        Ok(())
    }

    /// Terminal failure path for `InvalidCaseNumber` (spec.md §4.6 step 5,
    /// §7): permanently skip this CaseFile until externally re-enabled.
    pub async fn mark_scan_invalid(&self, case_file_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE case_files SET scan_valid = false WHERE id = $1")
            .bind(case_file_id)
            .execute(self.repo.pool())
            .await?;
        Ok(())
    }
}
