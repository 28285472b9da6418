//! Worker (spec.md §4.6): polls the JobStore, runs the scrape pipeline
//! for each job, and reports success/failure back to the queue. The poll
//! loop's shape — fetch, process, log, sleep-and-retry-on-empty — is
//! lifted from the teacher's `scraper::worker::Worker::run`, generalized
//! from a single Subject-job type to the full pipeline in
//! [`pipeline::run_pipeline`].

pub mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, error, info, warn, Instrument};

use crate::browser::BrowserPool;
use crate::captcha::CaptchaChain;
use crate::clock::Clock;
use crate::extractor::FormSubmitter;
use crate::jobstore::{FailOutcome, JobStore, Lane};
use crate::objectstore::ObjectStore;
use crate::repository::Repository;

const EMPTY_QUEUE_BACKOFF: Duration = Duration::from_secs(5);
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(10);

pub struct Worker {
    id: String,
    lanes: Vec<Lane>,
    job_store: Arc<JobStore>,
    repository: Arc<Repository>,
    browser_pool: Arc<BrowserPool>,
    captcha_chain: Arc<CaptchaChain>,
    form_submitter: Arc<dyn FormSubmitter>,
    object_store: Arc<ObjectStore>,
    clock: Arc<dyn Clock>,
}

impl Worker {
    /// `lanes` restricts which lanes this worker polls (spec.md §5:
    /// workers are partitioned into per-lane pools, each sized
    /// independently rather than all workers polling every lane).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        lanes: Vec<Lane>,
        job_store: Arc<JobStore>,
        repository: Arc<Repository>,
        browser_pool: Arc<BrowserPool>,
        captcha_chain: Arc<CaptchaChain>,
        form_submitter: Arc<dyn FormSubmitter>,
        object_store: Arc<ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            lanes,
            job_store,
            repository,
            browser_pool,
            captcha_chain,
            form_submitter,
            object_store,
            clock,
        }
    }

    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(worker_id = %self.id, lanes = ?self.lanes, "worker started");
        loop {
            tokio::select! {
                result = self.job_store.next_ready(&self.id, &self.lanes) => {
                    match result {
                        Ok(Some(job)) => {
                            let job_id = job.id;
                            let lane = job.lane;
                            let attempt = job.attempt;
                            let span = tracing::info_span!("job", job_id = %job_id, lane = ?lane, attempt);
                            self.handle_job(job).instrument(span).await;
                        }
                        Ok(None) => {
                            time::sleep(EMPTY_QUEUE_BACKOFF).await;
                        }
                        Err(e) => {
                            warn!(worker_id = %self.id, error = ?e, "failed to poll for next job");
                            time::sleep(POLL_ERROR_BACKOFF).await;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!(worker_id = %self.id, "worker shutting down");
                    break;
                }
            }
        }
    }

    async fn handle_job(&self, job: crate::jobstore::Job) {
        let outcome = pipeline::run_pipeline(
            &job,
            &self.id,
            self.repository.as_ref(),
            self.browser_pool.as_ref(),
            self.captcha_chain.as_ref(),
            self.form_submitter.as_ref(),
            self.object_store.as_ref(),
            self.clock.as_ref(),
        )
        .await;

        match outcome {
            Ok(()) => {
                if let Err(e) = self.job_store.complete(job.id).await {
                    error!(job_id = %job.id, error = ?e, "failed to mark job completed");
                }
            }
            Err(app_err) => {
                let kind = app_err.kind();
                debug!(job_id = %job.id, ?kind, "job failed");
                let jitter = rand::rng().random_range(-1.0..=1.0);
                match self.job_store.fail(&job, kind, &app_err.to_string(), jitter).await {
                    Ok(FailOutcome::Retrying { run_at }) => {
                        warn!(job_id = %job.id, %run_at, "job failed, will retry");
                    }
                    Ok(FailOutcome::Exhausted) => {
                        error!(job_id = %job.id, "job failed terminally");
                    }
                    Err(e) => {
                        error!(job_id = %job.id, error = ?e, "failed to record job failure");
                    }
                }
            }
        }
    }
}
