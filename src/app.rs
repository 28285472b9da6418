use crate::browser::BrowserPool;
use crate::captcha::CaptchaChain;
use crate::captcha::solver::ExternalSolverClient;
use crate::cli::ServiceName;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::extractor::FormSubmitter;
use crate::extractor::portal::PortalFormSubmitter;
use crate::jobstore::rate_limiter::JobRateLimiter;
use crate::jobstore::JobStore;
use crate::objectstore::ObjectStore;
use crate::repository::Repository;
use crate::scheduler::Scheduler;
use crate::services::manager::ServiceManager;
use crate::services::scheduler::SchedulerService;
use crate::services::web::WebService;
use crate::services::worker::WorkerService;
use crate::status::ServiceStatusRegistry;
use crate::web::WebState;
use crate::worker::Worker;
use anyhow::Context;
use object_store::aws::AmazonS3Builder;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Main application struct wiring together every collaborator the
/// Scheduler and Worker services need (spec.md §4).
pub struct App {
    config: Config,
    repository: Arc<Repository>,
    job_store: Arc<JobStore>,
    browser_pool: Arc<BrowserPool>,
    clock: Arc<dyn Clock>,
    service_statuses: ServiceStatusRegistry,
    service_manager: ServiceManager,
    started_at: Instant,
}

impl App {
    /// Create a new App instance, connecting to the database, running
    /// migrations, and starting the browser pool. `config` is loaded and
    /// logging configured by the caller first, so startup diagnostics land
    /// in the configured subscriber rather than the default no-op one.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let is_private = config.database_url.contains("railway.internal");
        let slow_threshold = Duration::from_millis(if is_private { 200 } else { 500 });

        let db_pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(4)
            .acquire_slow_threshold(slow_threshold)
            .acquire_timeout(Duration::from_secs(4))
            .idle_timeout(Duration::from_secs(60 * 2))
            .max_lifetime(Duration::from_secs(60 * 30))
            .connect(&config.database_url)
            .await
            .context("Failed to create database pool")?;

        info!(
            is_private,
            slow_threshold = format!("{:.2?}", slow_threshold),
            "database pool established"
        );

        info!("running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("database migrations completed successfully");

        let repository = Arc::new(Repository::new(db_pool.clone()));

        let rate_limiter = Arc::new(JobRateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window,
        ));
        let job_store = Arc::new(
            JobStore::new(db_pool.clone(), rate_limiter)
                .with_retry_policy(config.max_job_attempts, (config.job_backoff_base_ms / 1000).max(1) as i64),
        );
        let recovered = job_store
            .recover_stale()
            .await
            .context("Failed to recover stale jobs at startup")?;
        if recovered > 0 {
            info!(recovered, "recovered jobs left active by an unclean shutdown");
        }

        let browser_pool = Arc::new(
            BrowserPool::new(config.browser_pool_size, config.max_pages_per_browser)
                .await
                .context("Failed to start browser pool")?,
        );

        let tz = chrono_tz::Tz::from_str(&config.timezone)
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", config.timezone))?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(tz));

        Ok(App {
            config,
            repository,
            job_store,
            browser_pool,
            clock,
            service_statuses: ServiceStatusRegistry::new(),
            service_manager: ServiceManager::new(),
            started_at: Instant::now(),
        })
    }

    fn object_store(&self) -> Result<Arc<dyn object_store::ObjectStore>, anyhow::Error> {
        let mut builder = AmazonS3Builder::new().with_bucket_name(&self.config.object_store_bucket);
        if let Some(endpoint) = &self.config.object_store_endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }
        if let Some(region) = &self.config.object_store_region {
            builder = builder.with_region(region);
        }
        if let Some(key) = &self.config.object_store_access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &self.config.object_store_secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        Ok(Arc::new(builder.build().context("Failed to build object store client")?))
    }

    /// Setup and register services based on enabled service list
    pub fn setup_services(&mut self, services: &[ServiceName]) -> Result<(), anyhow::Error> {
        if services.contains(&ServiceName::Web) {
            let web_state = WebState {
                repository: self.repository.clone(),
                job_store: self.job_store.clone(),
                browser_pool: self.browser_pool.clone(),
                clock: self.clock.clone(),
                service_statuses: self.service_statuses.clone(),
                service_secret: self.config.service_secret.clone(),
                started_at: self.started_at,
            };
            let web_service = Box::new(WebService::new(self.config.port, web_state));
            self.service_manager
                .register_service(ServiceName::Web.as_str(), web_service);
        }

        if services.contains(&ServiceName::Scheduler) {
            let scheduler = Arc::new(Scheduler::new(
                self.repository.clone(),
                self.job_store.clone(),
                self.clock.clone(),
                self.config.scheduler_interval,
            ));
            let scheduler_service = Box::new(SchedulerService::new(scheduler));
            self.service_manager
                .register_service(ServiceName::Scheduler.as_str(), scheduler_service);
        }

        if services.contains(&ServiceName::Worker) {
            let http = reqwest::Client::new();
            let solver = Arc::new(ExternalSolverClient::new(
                http.clone(),
                self.config.solver_api_base.clone(),
                self.config.solver_api_key.clone(),
            ));
            let captcha_chain = Arc::new(CaptchaChain::standard(solver));
            let form_submitter: Arc<dyn FormSubmitter> = Arc::new(PortalFormSubmitter::with_timeouts(
                self.config.portal_base_url.clone(),
                http,
                std::time::Duration::from_millis(self.config.page_timeout_ms),
                std::time::Duration::from_millis(self.config.navigation_timeout_ms),
            ));
            let object_store = Arc::new(ObjectStore::new(self.object_store()?));

            // Per-lane worker pools: PRIORITY=floor(W/3), MONITOR=W,
            // INITIAL=floor(W/2), minimum 1 each (spec.md §5).
            let w = self.config.worker_concurrency;
            let lane_pools = [
                (crate::jobstore::Lane::Priority, "priority", (w / 3).max(1)),
                (crate::jobstore::Lane::Initial, "initial", (w / 2).max(1)),
                (crate::jobstore::Lane::Monitor, "monitor", w.max(1)),
            ];

            for (lane, label, count) in lane_pools {
                for i in 0..count {
                    let worker_id = format!("worker-{label}-{i}");
                    let worker = Arc::new(Worker::new(
                        worker_id.clone(),
                        vec![lane],
                        self.job_store.clone(),
                        self.repository.clone(),
                        self.browser_pool.clone(),
                        captcha_chain.clone(),
                        form_submitter.clone(),
                        object_store.clone(),
                        self.clock.clone(),
                    ));
                    let worker_service = Box::new(WorkerService::new(worker_id.clone(), worker));
                    self.service_manager.register_service(&worker_id, worker_service);
                }
            }
        }

        if !self.service_manager.has_services() {
            return Err(anyhow::anyhow!("No services enabled. Cannot start application."));
        }

        Ok(())
    }

    /// Start all registered services
    pub fn start_services(&mut self) {
        self.service_manager.spawn_all();
    }

    /// Run the application and handle shutdown signals
    pub async fn run(self) -> ExitCode {
        use crate::signals::handle_shutdown_signals;
        handle_shutdown_signals(self.service_manager, self.config.shutdown_timeout).await
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
