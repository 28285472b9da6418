//! Configuration for the Portal Scrape Coordination Engine.
//!
//! Loaded via figment from the environment. Durations accept both bare
//! integers (seconds) and unit-suffixed strings ("30s", "2m", "1500ms").

use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Config {
    /// Base log level; combined with a per-module filter in `logging::setup_logging`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Port for the inbound control API (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared relational store connection, also backing the JobStore tables.
    pub database_url: String,
    /// Graceful shutdown timeout. Accepts numeric seconds or duration strings.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,

    /// IANA timezone name used to resolve notification-schedule local times
    /// (spec.md §4.1, §4.3).
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Base URL of the judicial case-file Portal.
    pub portal_base_url: String,

    /// Number of concurrent browser sessions (spec.md §6 `browserPoolSize`).
    #[serde(default = "default_browser_pool_size")]
    pub browser_pool_size: usize,
    /// Pages opened before a session is recycled (`maxPagesPerBrowser`).
    #[serde(default = "default_max_pages_per_browser")]
    pub max_pages_per_browser: u32,
    /// Number of Worker instances polling the JobStore (`workerConcurrency`).
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    /// Scheduler tick interval (`schedulerIntervalMinutes`, default 10).
    #[serde(
        default = "default_scheduler_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub scheduler_interval: Duration,

    /// Job rate limit: max jobs dispatched per `rate_limit_window`.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    #[serde(
        default = "default_rate_limit_window",
        deserialize_with = "deserialize_duration"
    )]
    pub rate_limit_window: Duration,

    /// External CAPTCHA solver API (spec.md §4.5, §6).
    pub solver_api_base: String,
    pub solver_api_key: String,

    /// Object store for downloaded file attachments (spec.md §4.6 step 9).
    pub object_store_bucket: String,
    #[serde(default)]
    pub object_store_endpoint: Option<String>,
    #[serde(default)]
    pub object_store_region: Option<String>,
    #[serde(default)]
    pub object_store_access_key_id: Option<String>,
    #[serde(default)]
    pub object_store_secret_access_key: Option<String>,

    /// Shared secret gating `POST /jobs/initial`, `POST /jobs/priority`, and
    /// `GET /status` (spec.md §6 `serviceSecret`).
    pub service_secret: String,

    /// Per-page navigation timeout for a single Portal page load (spec.md
    /// §6 `pageTimeoutMs`).
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,
    /// Timeout for the initial navigation to the Portal search form
    /// (spec.md §6 `navigationTimeoutMs`).
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    /// Max attempts before a retryable job failure becomes terminal
    /// (spec.md §6 `maxJobAttempts`).
    #[serde(default = "default_max_job_attempts")]
    pub max_job_attempts: i32,
    /// Base delay for the exponential backoff applied between retries
    /// (spec.md §6 `jobBackoffBaseMs`).
    #[serde(default = "default_job_backoff_base_ms")]
    pub job_backoff_base_ms: u64,
}

impl Config {
    /// Load configuration from the environment (figment), remapping
    /// Railway's deployment-draining env var onto `shutdown_timeout`.
    pub fn load() -> Result<Self, figment::Error> {
        use figment::value::UncasedStr;
        use figment::{Figment, providers::Env};

        Figment::new()
            .merge(Env::raw().map(|k| {
                if k == UncasedStr::new("RAILWAY_DEPLOYMENT_DRAINING_SECONDS") {
                    "SHUTDOWN_TIMEOUT".into()
                } else {
                    k.into()
                }
            }))
            .extract()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_browser_pool_size() -> usize {
    crate::browser::pool::DEFAULT_POOL_SIZE
}

fn default_max_pages_per_browser() -> u32 {
    crate::browser::pool::DEFAULT_RECYCLE_AFTER_PAGES
}

fn default_worker_concurrency() -> usize {
    3
}

fn default_scheduler_interval() -> Duration {
    crate::scheduler::DEFAULT_TICK
}

fn default_rate_limit_max() -> u32 {
    10
}

fn default_rate_limit_window() -> Duration {
    Duration::from_secs(60)
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_navigation_timeout_ms() -> u64 {
    45_000
}

fn default_max_job_attempts() -> i32 {
    crate::jobstore::model::DEFAULT_MAX_ATTEMPTS
}

fn default_job_backoff_base_ms() -> u64 {
    (crate::jobstore::model::DEFAULT_BACKOFF_BASE_SECS * 1000) as u64
}

/// Duration parser accepting seconds (default), milliseconds, and minutes,
/// with whitespace allowed between the number and unit.
const DURATION_PARSER: DurationParser<'static> = DurationParser::builder()
    .time_units(&[TimeUnit::Second, TimeUnit::MilliSecond, TimeUnit::Minute])
    .parse_multiple(None)
    .allow_time_unit_delimiter()
    .disable_infinity()
    .disable_fraction()
    .disable_exponent()
    .default_unit(TimeUnit::Second)
    .build();

/// Accepts unsigned/signed integers (seconds) or a duration string like
/// "30s", "2m", "1500ms".
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a duration string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            DURATION_PARSER
                .parse(value)
                .map_err(|e| {
                    serde::de::Error::custom(format!(
                        "invalid duration '{}': {}. examples: '30', '30s', '2m', '1500ms'",
                        value, e
                    ))
                })?
                .try_into()
                .map_err(|e| serde::de::Error::custom(format!("duration conversion error: {}", e)))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value < 0 {
                return Err(serde::de::Error::custom("duration cannot be negative"));
            }
            Ok(Duration::from_secs(value as u64))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
