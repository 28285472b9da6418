//! Scheduler (spec.md §4.1): wakes up on a fixed tick, walks every tenant
//! with an enabled `portal-monitoring` schedule, and enqueues MONITOR
//! jobs for CaseFiles the adaptive rule says are due.
//!
//! Structured after the teacher's `scraper::scheduler::Scheduler::run`
//! (fixed-tick `tokio::select!` loop, work spawned onto its own task so
//! shutdown can race it), but fixes that loop's reentrancy bug: the
//! teacher overwrites `current_work` on every tick even if the previous
//! tick's task is still running, silently dropping its `JoinHandle` (and,
//! because `JoinHandle`'s `Drop` detaches rather than cancels, leaving it
//! running unobserved). Here a tick is skipped outright — logged, not
//! queued — whenever the prior tick hasn't finished, which is what
//! spec.md §4.1 calls a "true reentrancy guard".

pub mod adaptive;
pub mod priority;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::jobstore::{JobPayload, JobStore, Lane};
use crate::repository::Repository;

use adaptive::SchedulingFacts;

pub const DEFAULT_TICK: Duration = Duration::from_secs(10 * 60);

pub struct Scheduler {
    repository: Arc<Repository>,
    job_store: Arc<JobStore>,
    clock: Arc<dyn Clock>,
    tick: Duration,
    running: std::sync::atomic::AtomicBool,
}

impl Scheduler {
    pub fn new(repository: Arc<Repository>, job_store: Arc<JobStore>, clock: Arc<dyn Clock>, tick: Duration) -> Self {
        Self {
            repository,
            job_store,
            clock,
            tick,
            running: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(tick_secs = self.tick.as_secs(), "scheduler service started");
        let mut interval = time::interval(self.tick);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_one_tick().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("scheduler service shutting down");
                    break;
                }
            }
        }
    }

    async fn run_one_tick(&self) {
        use std::sync::atomic::Ordering;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("previous scheduler tick still running, skipping this tick");
            return;
        }

        if let Err(e) = self.evaluate_all_tenants().await {
            error!(error = ?e, "scheduler tick failed");
        }

        self.running.store(false, Ordering::SeqCst);
    }

    async fn evaluate_all_tenants(&self) -> crate::error::Result<()> {
        let schedules = self.repository.tenants().enabled_monitoring_schedules().await?;
        let current_hhmm = self.clock.local_now().format("%H:%M").to_string();

        for schedule in schedules {
            let case_files = self
                .repository
                .case_files()
                .eligible_for_tenant(schedule.tenant_id)
                .await?;

            if case_files.is_empty() {
                continue;
            }

            let ids: Vec<uuid::Uuid> = case_files.iter().map(|c| c.id).collect();
            let snapshots = self.repository.snapshots().batch_load(&ids).await?;
            let nearest_hour = crate::domain::tenant::nearest_upcoming_hour(&current_hhmm, &schedule.times);

            let mut enqueued = 0u32;
            for case_file in &case_files {
                let snapshot = snapshots.get(&case_file.id);
                let facts = SchedulingFacts::from_case_file(case_file.created_at, case_file.last_scraped_at, snapshot);

                if !adaptive::is_due(&facts, self.clock.now()) {
                    continue;
                }

                let job_priority = priority::monitor_priority(&current_hhmm, &nearest_hour);
                let payload = JobPayload {
                    case_file_id: case_file.id,
                    tenant_id: schedule.tenant_id,
                    case_number: case_file.external_case_number.clone(),
                };

                match self
                    .job_store
                    .enqueue(Lane::Monitor, payload, job_priority, self.clock.as_ref())
                    .await
                {
                    Ok(Some(_)) => enqueued += 1,
                    Ok(None) => debug!(case_file_id = %case_file.id, "monitor job already queued for today"),
                    Err(e) => error!(case_file_id = %case_file.id, error = ?e, "failed to enqueue monitor job"),
                }
            }

            if enqueued > 0 {
                info!(tenant_id = %schedule.tenant_id, enqueued, "scheduled monitor jobs");
            }
        }

        Ok(())
    }
}
