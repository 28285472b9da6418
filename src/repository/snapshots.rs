use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::Snapshot;
use crate::error::Result;
use crate::repository::Repository;

pub struct SnapshotOps<'a> {
    repo: &'a Repository,
}

impl<'a> SnapshotOps<'a> {
    pub(crate) fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    pub async fn find(&self, case_file_id: Uuid) -> Result<Option<Snapshot>> {
        let row = sqlx::query_as::<_, Snapshot>("SELECT * FROM snapshots WHERE case_file_id = $1")
            .bind(case_file_id)
            .fetch_optional(self.repo.pool())
            .await?;
        Ok(row)
    }

    /// Batch-load the Snapshot for every selected CaseFile in one query
    /// (spec.md §4.1 step 3), keyed by CaseFile id.
    pub async fn batch_load(&self, case_file_ids: &[Uuid]) -> Result<HashMap<Uuid, Snapshot>> {
        if case_file_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, Snapshot>(
            "SELECT * FROM snapshots WHERE case_file_id = ANY($1)",
        )
        .bind(case_file_ids)
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows.into_iter().map(|s| (s.case_file_id, s)).collect())
    }

    /// Upsert by unique `case_file_id` (spec.md §3: exactly one Snapshot
    /// per CaseFile). `scrape_count` increments; `consecutive_no_change`
    /// resets to 0 on a change, else increments.
    pub async fn upsert(&self, tx: &mut sqlx::PgConnection, snapshot: &Snapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (
                case_file_id, content_hash, binnacle_count, canonical_payload,
                last_scraped_at, last_changed_at, scrape_count,
                consecutive_no_change, error_count, last_error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (case_file_id) DO UPDATE SET
                content_hash = EXCLUDED.content_hash,
                binnacle_count = EXCLUDED.binnacle_count,
                canonical_payload = EXCLUDED.canonical_payload,
                last_scraped_at = EXCLUDED.last_scraped_at,
                last_changed_at = EXCLUDED.last_changed_at,
                scrape_count = EXCLUDED.scrape_count,
                consecutive_no_change = EXCLUDED.consecutive_no_change,
                error_count = EXCLUDED.error_count,
                last_error = EXCLUDED.last_error
            "#,
        )
        .bind(snapshot.case_file_id)
        .bind(&snapshot.content_hash)
        .bind(snapshot.binnacle_count)
        .bind(&snapshot.canonical_payload)
        .bind(snapshot.last_scraped_at)
        .bind(snapshot.last_changed_at)
        .bind(snapshot.scrape_count)
        .bind(snapshot.consecutive_no_change)
        .bind(snapshot.error_count)
        .bind(&snapshot.last_error)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }

    /// Records a failed attempt against the Snapshot's error bookkeeping
    /// (spec.md §7: `lastError`/`errorCount` updated on every failed
    /// attempt; cleared on success). A no-op if no Snapshot exists yet
    /// (e.g. the CaseFile's first scrape failed).
    pub async fn record_error(&self, case_file_id: Uuid, message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE snapshots SET error_count = error_count + 1, last_error = $2 \
             WHERE case_file_id = $1",
        )
        .bind(case_file_id)
        .bind(message)
        .execute(self.repo.pool())
        .await?;
        Ok(())
    }
}
