use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{JobKind, JobLogEntry, JobLogStatus};
use crate::error::Result;
use crate::repository::Repository;

pub struct JobLogOps<'a> {
    repo: &'a Repository,
}

impl<'a> JobLogOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Writes the `STARTED` row (spec.md §4.6 step 1) and returns its id so
    /// the Worker can update the same row to `COMPLETED`/`FAILED`/`RETRYING`.
    #[allow(clippy::too_many_arguments)]
    pub async fn start(
        &self,
        case_file_id: Uuid,
        tenant_id: Uuid,
        job_kind: JobKind,
        attempt: i32,
        worker_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO job_log_entries (
                id, case_file_id, tenant_id, job_kind, status, attempt,
                worker_id, started_at
            )
            VALUES (gen_random_uuid(), $1, $2, $3, 'STARTED', $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(case_file_id)
        .bind(tenant_id)
        .bind(job_kind)
        .bind(attempt)
        .bind(worker_id)
        .bind(started_at)
        .fetch_one(self.repo.pool())
        .await?;
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn finish(
        &self,
        id: Uuid,
        status: JobLogStatus,
        completed_at: DateTime<Utc>,
        duration_ms: i32,
        binnacles_found: Option<i32>,
        changes_detected: Option<i32>,
        error_kind: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE job_log_entries SET
                status = $2, completed_at = $3, duration_ms = $4,
                binnacles_found = $5, changes_detected = $6,
                error_kind = $7, error_message = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(completed_at)
        .bind(duration_ms)
        .bind(binnacles_found)
        .bind(changes_detected)
        .bind(error_kind)
        .bind(error_message)
        .execute(self.repo.pool())
        .await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<JobLogEntry>> {
        let row = sqlx::query_as::<_, JobLogEntry>("SELECT * FROM job_log_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(self.repo.pool())
            .await?;
        Ok(row)
    }
}
