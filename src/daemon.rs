/// Core daemon implementation for the exporter
///
/// This module wires the service together:
/// 1. Loads the station registry (fatal on any metadata failure)
/// 2. Launches one poller per recognized (station, parameter), staggered
///    to respect the upstream rate limit
/// 3. Hands out the scrape context for the HTTP endpoint
/// 4. On shutdown, stops every poller and waits for in-flight fetches
///    to drain

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::info;
use threadpool::ThreadPool;

use crate::config::Config;
use crate::endpoint::ScrapeContext;
use crate::ingest::fetch::Fetch;
use crate::ingest::hydapi::HydApi;
use crate::model::StartupError;
use crate::monitor::SnapshotStore;
use crate::poller::{ParameterPoller, PollerSettings};
use crate::shutdown::Shutdown;
use crate::stations::Registry;

/// Main daemon state
pub struct Daemon {
    api: Arc<HydApi>,
    store: Arc<SnapshotStore>,
    registry: Option<Arc<Registry>>,
    settings: PollerSettings,
    station_ids: Vec<String>,
    throttle: Duration,
    shutdown: Shutdown,
    pool: Option<ThreadPool>,
    pollers: usize,
}

impl Daemon {
    /// Create a daemon over `fetcher` with settings taken from `config`.
    pub fn new(config: &Config, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            api: Arc::new(HydApi::new(fetcher, &config.base_url)),
            store: Arc::new(SnapshotStore::new()),
            registry: None,
            settings: config.poller_settings(),
            station_ids: config.station_ids.clone(),
            throttle: config.metadata_throttle,
            shutdown: Shutdown::new(),
            pool: None,
            pollers: 0,
        }
    }

    /// Override the poller timing (tests use sub-second intervals).
    pub fn with_settings(mut self, settings: PollerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Initialize daemon: load station metadata
    pub fn initialize(&mut self) -> Result<(), StartupError> {
        info!("Loading station metadata from {}", self.api.base_url());
        let registry = Registry::load(&self.api, &self.station_ids, self.throttle)?;
        info!(
            "Loaded {} stations, {} series to poll",
            registry.len(),
            registry.poll_targets().len()
        );
        self.registry = Some(Arc::new(registry));
        Ok(())
    }

    pub fn registry(&self) -> Option<&Arc<Registry>> {
        self.registry.as_ref()
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Launch one poller per target. Each poller runs its first poll as
    /// soon as it starts; launches are separated by the metadata throttle
    /// so that burst stays under the rate limit.
    ///
    /// Returns the number of pollers started.
    pub fn start_pollers(&mut self) -> Result<usize, StartupError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| StartupError::Config("daemon not initialized".to_string()))?;

        let targets = registry.poll_targets();
        if targets.is_empty() {
            info!("No recognized parameters to poll");
            return Ok(0);
        }

        let pool = ThreadPool::with_name("poller".to_string(), targets.len());
        for (i, target) in targets.into_iter().enumerate() {
            if i > 0 && !self.throttle.is_zero() && self.shutdown.wait_until(Instant::now() + self.throttle) {
                break;
            }
            let poller = ParameterPoller::new(
                target,
                Arc::clone(&self.api),
                Arc::clone(&self.store),
                self.settings,
            );
            let shutdown = self.shutdown.clone();
            pool.execute(move || poller.run(shutdown));
            self.pollers += 1;
        }

        info!(
            "Started {} pollers (interval {:?}, max age {} h)",
            self.pollers,
            self.settings.interval,
            self.settings.max_age.num_hours()
        );
        self.pool = Some(pool);
        Ok(self.pollers)
    }

    /// Scrape context for the endpoint. Available as soon as the registry
    /// is loaded, so the endpoint can serve while pollers are still being
    /// launched; `pollers` counts the series that get one.
    pub fn scrape_context(&self) -> Option<ScrapeContext> {
        self.registry.as_ref().map(|registry| ScrapeContext {
            registry: Arc::clone(registry),
            store: Arc::clone(&self.store),
            pollers: registry.poll_targets().len(),
        })
    }

    /// Block until shutdown is requested, then wait for every poller to
    /// finish its current tick and exit.
    pub fn run_until_shutdown(mut self) {
        self.shutdown.wait();
        info!("Shutdown requested, waiting for pollers to drain");
        self.join();
    }

    /// Trip the shutdown signal and wait for pollers to exit.
    pub fn stop(mut self) {
        self.shutdown.trigger();
        self.join();
    }

    fn join(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.join();
            if pool.panic_count() > 0 {
                log::error!("{} pollers panicked", pool.panic_count());
            }
        }
        info!("All pollers stopped");
    }
}

/// Log a fatal startup error, then exit non-zero after `delay` so a
/// supervising process manager does not restart us in a tight loop.
pub fn exit_on_error(context: &str, err: &dyn std::error::Error, delay: Duration) -> ! {
    log::error!("{}: {}", context, err);
    log::error!("Exiting...");
    thread::sleep(delay);
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
