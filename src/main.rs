use clap::Parser;
use tracing::{error, info};

use portal_watch::app::App;
use portal_watch::cli::{Args, ServiceName};
use portal_watch::config::Config;
use portal_watch::logging;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e:?}");
            return std::process::ExitCode::FAILURE;
        }
    };

    logging::setup_logging(&config, args.tracing);

    let mut app = match App::new(config).await {
        Ok(app) => app,
        Err(e) => {
            error!(error = ?e, "failed to initialize application");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting portal-watch"
    );

    if let Err(e) = app.setup_services(&ServiceName::all()) {
        error!(error = ?e, "failed to set up services");
        return std::process::ExitCode::FAILURE;
    }

    app.start_services();
    app.run().await
}
