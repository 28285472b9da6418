//! `JobStore`: the durable, Postgres-backed three-lane job queue (spec.md
//! §4.2). Polling uses `FOR UPDATE SKIP LOCKED` and batch enqueue uses
//! `UNNEST`, both lifted directly from `db/scrape_jobs.rs`'s
//! `lock_next`/`batch_insert`; dedup follows that file's
//! `find_existing_payloads` approach but enforced at insert time via a
//! unique index on `dedup_key` rather than a pre-check, since this queue's
//! dedup keys are true identity keys (not just "don't double-schedule this
//! tick").

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, ErrorKind, Result};

use super::model::{backoff_delay, dedup_key, Job, JobPayload, JobState, Lane, DEFAULT_BACKOFF_BASE_SECS, DEFAULT_MAX_ATTEMPTS};
use super::rate_limiter::SharedJobRateLimiter;

pub struct JobStore {
    pool: PgPool,
    rate_limiter: SharedJobRateLimiter,
    max_attempts: i32,
    backoff_base_secs: i64,
}

/// Outcome of completing a job: whether it should be removed from the
/// active set or requeued.
pub enum FailOutcome {
    Retrying { run_at: chrono::DateTime<Utc> },
    Exhausted,
}

impl JobStore {
    pub fn new(pool: PgPool, rate_limiter: SharedJobRateLimiter) -> Self {
        Self {
            pool,
            rate_limiter,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
        }
    }

    /// Override the configured `max_job_attempts`/`job_backoff_base_ms`
    /// (spec.md §6) instead of the fallback defaults.
    pub fn with_retry_policy(mut self, max_attempts: i32, backoff_base_secs: i64) -> Self {
        self.max_attempts = max_attempts;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    /// Recover jobs left `active` by an unclean shutdown of a previous
    /// process, returning them to `pending` (teacher's `force_unlock_all`).
    pub async fn recover_stale(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE jobstore_jobs SET state = 'pending', locked_by = NULL, locked_at = NULL \
             WHERE state = 'active'",
        )
        .execute(&self.pool)
        .await?;
        let n = result.rows_affected();
        if n > 0 {
            warn!(count = n, "recovered stale active jobs at startup");
        }
        Ok(n)
    }

    /// Insert a new job. A dedup-key collision is not an error: the
    /// existing job for that key wins and this call is a no-op, mirroring
    /// `find_existing_payloads`'s "don't double-schedule" intent but
    /// pushed into the database as `ON CONFLICT DO NOTHING`.
    pub async fn enqueue(
        &self,
        lane: Lane,
        payload: JobPayload,
        priority: i16,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>> {
        let now = clock.now();
        let day = clock.today_compact();
        let key = dedup_key(lane, payload.case_file_id, &day, now.timestamp_millis());
        let payload_json = serde_json::to_value(&payload)
            .map_err(|e| AppError::ValidationFailed(format!("unserializable job payload: {e}")))?;

        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO jobstore_jobs
                (id, lane, payload, priority, dedup_key, attempt, max_attempts, state, run_at, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, 'pending', $7, $7)
            ON CONFLICT (dedup_key) WHERE state IN ('pending', 'active', 'delayed') DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lane)
        .bind(&payload_json)
        .bind(priority)
        .bind(&key)
        .bind(self.max_attempts)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if id.is_none() {
            debug!(dedup_key = %key, "job already queued, skipping enqueue");
        }
        Ok(id)
    }

    /// Claim the next ready job for `worker_id` among `lanes`, respecting
    /// lane poll order (PRIORITY > INITIAL > MONITOR), in-lane priority
    /// number, FIFO ties, and the shared rate limiter. `lanes` restricts
    /// this worker to its assigned lane pool (spec.md §5 per-lane worker
    /// concurrency partitioning).
    pub async fn next_ready(&self, worker_id: &str, lanes: &[Lane]) -> Result<Option<Job>> {
        self.rate_limiter.until_ready().await;

        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobstore_jobs
            WHERE state IN ('pending', 'delayed') AND run_at <= NOW() AND lane = ANY($1)
            ORDER BY
                CASE lane
                    WHEN 'PRIORITY' THEN 0
                    WHEN 'INITIAL' THEN 1
                    WHEN 'MONITOR' THEN 2
                END,
                priority ASC,
                created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(lanes)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(job) = job else {
            tx.commit().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE jobstore_jobs SET state = 'active', locked_by = $2, locked_at = NOW(), attempt = attempt + 1 \
             WHERE id = $1",
        )
        .bind(job.id)
        .bind(worker_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut job = job;
        job.state = JobState::Active;
        job.attempt += 1;
        job.locked_by = Some(worker_id.to_string());
        Ok(Some(job))
    }

    pub async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE jobstore_jobs SET state = 'completed' WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Fail a job. Retryable kinds with attempts remaining get an
    /// exponential-backoff delay; otherwise the job is terminally failed
    /// (spec.md §4.2, §7). `jitter_unit` should be a fresh random value in
    /// `[-1.0, 1.0]` supplied by the caller so this function stays pure.
    pub async fn fail(
        &self,
        job: &Job,
        error_kind: ErrorKind,
        error_message: &str,
        jitter_unit: f64,
    ) -> Result<FailOutcome> {
        let retryable = error_kind.retryable() && job.attempt < job.max_attempts;

        if retryable {
            let delay = backoff_delay(job.attempt, jitter_unit, self.backoff_base_secs);
            let run_at = Utc::now() + delay;
            sqlx::query(
                "UPDATE jobstore_jobs SET state = 'delayed', run_at = $2, last_error = $3, \
                 locked_by = NULL, locked_at = NULL WHERE id = $1",
            )
            .bind(job.id)
            .bind(run_at)
            .bind(error_message)
            .execute(&self.pool)
            .await?;
            Ok(FailOutcome::Retrying { run_at })
        } else {
            sqlx::query(
                "UPDATE jobstore_jobs SET state = 'failed', last_error = $2, \
                 locked_by = NULL, locked_at = NULL WHERE id = $1",
            )
            .bind(job.id)
            .bind(error_message)
            .execute(&self.pool)
            .await?;
            Ok(FailOutcome::Exhausted)
        }
    }

    /// Counts of jobs per lane/state, backing `GET /status` (spec.md §6).
    pub async fn lane_counts(&self) -> Result<Vec<(Lane, JobState, i64)>> {
        let rows: Vec<(Lane, JobState, i64)> = sqlx::query_as(
            "SELECT lane, state, COUNT(*) FROM jobstore_jobs GROUP BY lane, state",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>> {
        Ok(self.pool.begin().await?)
    }
}
