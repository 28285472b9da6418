use clap::Parser;

/// Portal Scrape Coordination Engine.
///
/// Runs all services:
/// - web: inbound control API (spec.md §6)
/// - scheduler: adaptive monitor-job enqueueing (spec.md §4.1)
/// - worker: job pipeline execution (spec.md §4.6)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log formatter to use
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum TracingFormat {
    /// Use pretty formatter (default in debug mode)
    Pretty,
    /// Use JSON formatter (default in release mode)
    Json,
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq)]
pub enum ServiceName {
    /// Inbound control API (`/jobs/initial`, `/jobs/priority`, `/health`, `/metrics`, `/status`)
    Web,
    /// Adaptive monitor-job scheduler
    Scheduler,
    /// Job pipeline worker pool
    Worker,
}

impl ServiceName {
    /// Get all available services
    pub fn all() -> Vec<ServiceName> {
        vec![ServiceName::Web, ServiceName::Scheduler, ServiceName::Worker]
    }

    /// Convert to string for service registration
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Web => "web",
            ServiceName::Scheduler => "scheduler",
            ServiceName::Worker => "worker",
        }
    }
}

#[cfg(debug_assertions)]
const DEFAULT_TRACING_FORMAT: TracingFormat = TracingFormat::Pretty;
#[cfg(not(debug_assertions))]
const DEFAULT_TRACING_FORMAT: TracingFormat = TracingFormat::Json;

fn default_tracing_format() -> TracingFormat {
    DEFAULT_TRACING_FORMAT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_as_str() {
        assert_eq!(ServiceName::Web.as_str(), "web");
        assert_eq!(ServiceName::Scheduler.as_str(), "scheduler");
        assert_eq!(ServiceName::Worker.as_str(), "worker");
    }

    #[test]
    fn test_service_name_all() {
        let all = ServiceName::all();
        assert_eq!(all.len(), 3);
    }
}
