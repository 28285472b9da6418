//! Transactional access to the shared relational store (spec.md §2.3).
//!
//! Mirrors the teacher's `DbContext` wrapper (`db/context.rs`): one cheaply
//! cloneable struct holding the pool, with per-entity operations grouped
//! into small `XxxOps` structs borrowed from it. Unlike the teacher, there
//! is no in-process event buffer here — change notification is the
//! downstream consumer's job, done by polling `ChangeLogEntry.notified`,
//! not by an in-process broadcast.

pub mod binnacles;
pub mod case_files;
pub mod change_log;
pub mod job_log;
pub mod notifications;
pub mod snapshots;
pub mod tenants;

use sqlx::PgPool;

#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn tenants(&self) -> tenants::TenantOps<'_> {
        tenants::TenantOps::new(self)
    }

    pub fn case_files(&self) -> case_files::CaseFileOps<'_> {
        case_files::CaseFileOps::new(self)
    }

    pub fn binnacles(&self) -> binnacles::BinnacleOps<'_> {
        binnacles::BinnacleOps::new(self)
    }

    pub fn notifications(&self) -> notifications::NotificationOps<'_> {
        notifications::NotificationOps::new(self)
    }

    pub fn snapshots(&self) -> snapshots::SnapshotOps<'_> {
        snapshots::SnapshotOps::new(self)
    }

    pub fn change_log(&self) -> change_log::ChangeLogOps<'_> {
        change_log::ChangeLogOps::new(self)
    }

    pub fn job_log(&self) -> job_log::JobLogOps<'_> {
        job_log::JobLogOps::new(self)
    }

    /// Startup self-check: a cheap round-trip proving the pool is live.
    /// Backs `GET /health`'s `database` field (SPEC_FULL.md §B.1).
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
