//! NVE HydAPI Prometheus exporter - main daemon
//!
//! A long-running service that:
//! 1. Loads metadata for the configured NVE stations
//! 2. Polls the latest observation of every recognized parameter
//! 3. Validates each reading (freshness and physical plausibility)
//! 4. Serves the current state on /metrics for Prometheus to scrape
//!
//! Usage:
//!   nve_exporter --key <API_KEY> --stations 2.11.0,12.209.0
//!   nve_exporter --config /etc/nve_exporter.toml --listen 0.0.0.0:9150
//!
//! Environment:
//!   NVE_API_KEY  - HydAPI key (overridden by --key)
//!   NVE_STATIONS - comma separated station ids (overridden by --stations)
//!   RUST_LOG     - log filter, defaults to "info"

use std::sync::Arc;
use std::thread;

use log::{error, info};

use nve_exporter::config::{Args, Config};
use nve_exporter::daemon::{Daemon, exit_on_error};
use nve_exporter::endpoint::Endpoint;
use nve_exporter::ingest::fetch::HttpFetcher;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let defaults = Config::default();

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => exit_on_error("Invalid configuration", &e, defaults.exit_delay),
    };

    info!(
        "Starting {} {} for {} stations",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.station_ids.len()
    );

    let fetcher = match HttpFetcher::new(&config.api_key, config.fetch_timeout) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => exit_on_error("Failed to build HTTP client", &e, config.exit_delay),
    };

    let mut daemon = Daemon::new(&config, fetcher);
    if let Err(e) = daemon.initialize() {
        exit_on_error("Failed to load station metadata", &e, config.exit_delay);
    }

    let endpoint = match Endpoint::bind(&config.listen) {
        Ok(endpoint) => endpoint,
        Err(e) => exit_on_error("Failed to start HTTP endpoint", &e, config.exit_delay),
    };

    let shutdown = daemon.shutdown_handle();
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Received interrupt, shutting down");
            shutdown.trigger();
        }) {
            error!("Failed to install signal handler: {}", e);
        }
    }

    let Some(ctx) = daemon.scrape_context() else {
        error!("Daemon has no station registry");
        std::process::exit(1);
    };
    let server = {
        let shutdown = shutdown.clone();
        thread::Builder::new()
            .name("endpoint".to_string())
            .spawn(move || endpoint.serve(ctx, shutdown))
    };
    let server = match server {
        Ok(handle) => handle,
        Err(e) => exit_on_error("Failed to spawn endpoint thread", &e, config.exit_delay),
    };

    // The endpoint is already serving while launches are staggered.
    if let Err(e) = daemon.start_pollers() {
        exit_on_error("Failed to start pollers", &e, config.exit_delay);
    }

    daemon.run_until_shutdown();

    if server.join().is_err() {
        error!("Endpoint thread panicked");
    }
    info!("Shutdown complete");
}
