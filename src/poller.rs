/// Per-series polling task.
///
/// One `ParameterPoller` per (station, recognized parameter). Each poller
/// fetches the latest observation, validates it and writes the resulting
/// record to the shared snapshot store, then sleeps until its next tick.
/// Pollers share nothing but the store, the HydAPI client and the
/// shutdown signal; there is no ordering between them.
///
/// State machine:
///
/// ```text
///   Priming ──(first attempt, success or failure)──▶ Steady ──▶ ...
/// ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::ingest::hydapi::HydApi;
use crate::model::{FetchError, MeasurementRecord, SeriesKey};
use crate::monitor::SnapshotStore;
use crate::shutdown::Shutdown;
use crate::stations::PollTarget;
use crate::validity::{self, Verdict};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing shared by every poller.
#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    /// Time between the starts of consecutive ticks.
    pub interval: Duration,
    /// Observations older than this are stale.
    pub max_age: chrono::Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            max_age: chrono::Duration::hours(24),
        }
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No poll attempt has completed yet.
    Priming,
    /// Ticking until shutdown.
    Steady,
}

/// Result of one poll attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Fresh, plausible reading stored as valid.
    Accepted { value: f64 },
    /// Reading stored, but flagged invalid.
    Rejected(Verdict),
    /// Fetch failed; record flagged invalid.
    Failed(FetchError),
    /// Shutdown landed while the fetch was in flight; nothing written.
    Discarded,
}

pub struct ParameterPoller {
    target: PollTarget,
    key: SeriesKey,
    api: Arc<HydApi>,
    store: Arc<SnapshotStore>,
    settings: PollerSettings,
    state: PollerState,
    ticks: u64,
}

impl ParameterPoller {
    /// Creates the poller and seeds a pending record for its key, so the
    /// series exists (as invalid) before the first poll completes.
    pub fn new(
        target: PollTarget,
        api: Arc<HydApi>,
        store: Arc<SnapshotStore>,
        settings: PollerSettings,
    ) -> Self {
        let key = target.key();
        store.register(key.clone());

        Self {
            target,
            key,
            api,
            store,
            settings,
            state: PollerState::Priming,
            ticks: 0,
        }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Completed poll attempts.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one poll attempt. Never fails: fetch errors are logged and
    /// recorded as an invalid record.
    pub fn poll(&mut self, shutdown: &Shutdown) -> PollOutcome {
        let station = &self.target.station;
        let fetched = self.api.latest_observation(&station.id, self.key.parameter);

        if shutdown.is_triggered() {
            debug!("{}: shutdown during fetch, discarding result", self.key);
            return PollOutcome::Discarded;
        }

        self.state = PollerState::Steady;
        self.ticks += 1;

        let observation = match fetched {
            Ok(observation) => observation,
            Err(e) => {
                self.store.invalidate(&self.key);
                error!(
                    "Failed to poll {} ({}) for {}: {}",
                    self.target.parameter.name, self.key.parameter, station.id, e
                );
                return PollOutcome::Failed(e);
            }
        };

        let verdict = validity::assess(
            &observation,
            self.target.kind,
            station.masl,
            self.settings.max_age,
            Utc::now(),
        );
        self.store.set(
            self.key.clone(),
            MeasurementRecord::from_observation(&observation, verdict.is_valid()),
        );

        match verdict {
            Verdict::Valid => {
                debug!(
                    "{} {} for {}: {} {}",
                    self.target.parameter.name,
                    self.key.parameter,
                    station.id,
                    observation.value,
                    self.target.parameter.unit
                );
                PollOutcome::Accepted {
                    value: observation.value,
                }
            }
            Verdict::Stale { age } => {
                warn!(
                    "Too old observation {} for {}: {} ({} hours old)",
                    self.key.parameter,
                    station.id,
                    observation.observed_at,
                    age.num_hours()
                );
                PollOutcome::Rejected(verdict)
            }
            Verdict::Implausible { reason } => {
                warn!(
                    "Invalid observation {} for {}: {} ({})",
                    self.key.parameter, station.id, observation.value, reason
                );
                PollOutcome::Rejected(verdict)
            }
        }
    }

    /// Polls immediately, then once per interval until `shutdown` trips.
    ///
    /// The next deadline is measured from the start of the previous tick.
    /// A tick that overruns the interval delays the next one; ticks never
    /// overlap.
    pub fn run(mut self, shutdown: Shutdown) {
        debug!("Starting poller for {}", self.key);

        loop {
            let started = Instant::now();
            if let PollOutcome::Discarded = self.poll(&shutdown) {
                break;
            }
            let next = started.checked_add(self.settings.interval);
            let stop = match next {
                Some(deadline) => shutdown.wait_until(deadline),
                None => {
                    shutdown.wait();
                    true
                }
            };
            if stop {
                break;
            }
        }

        info!("Poller for {} stopped after {} ticks", self.key, self.ticks);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
