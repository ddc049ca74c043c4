/// Station registry for the exporter.
///
/// Built once at startup from HydAPI station metadata and read-only
/// afterwards: pollers and the exporter share it through `Arc` and need
/// no synchronization.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::ingest::hydapi::HydApi;
use crate::model::{ParameterDescriptor, ParameterKind, SeriesKey, StartupError, Station};

/// Minimum delay between successive metadata requests. HydAPI allows
/// 5 requests per second per key.
pub const DEFAULT_METADATA_THROTTLE: Duration = Duration::from_secs(1);

/// One series that gets a poller.
#[derive(Debug, Clone)]
pub struct PollTarget {
    pub station: Arc<Station>,
    pub parameter: ParameterDescriptor,
    pub kind: ParameterKind,
}

impl PollTarget {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(&self.station.id, self.parameter.code)
    }
}

/// All configured stations, in configuration order.
#[derive(Debug, Default)]
pub struct Registry {
    stations: Vec<Arc<Station>>,
}

impl Registry {
    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self {
            stations: stations.into_iter().map(Arc::new).collect(),
        }
    }

    /// Fetches metadata for every id, sleeping `throttle` between calls.
    ///
    /// Blank ids are skipped and repeated ids are loaded once, in
    /// first-seen order, so every series ends up with a single poller.
    /// Any fetch failure aborts the load: the service has nothing useful
    /// to do without station identity.
    pub fn load(api: &HydApi, station_ids: &[String], throttle: Duration) -> Result<Self, StartupError> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for id in station_ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if seen.insert(id) {
                unique.push(id);
            } else {
                warn!("Station {} is configured more than once, ignoring duplicate", id);
            }
        }

        let mut stations = Vec::new();
        for (i, id) in unique.into_iter().enumerate() {
            if i > 0 && !throttle.is_zero() {
                thread::sleep(throttle);
            }

            let station = api.station(id).map_err(|source| StartupError::Metadata {
                station_id: id.to_string(),
                source,
            })?;

            info!(
                "Found station: {} ({}, {} m a.s.l., {} series)",
                station.name,
                station.id,
                station.masl,
                station.parameters.len()
            );
            stations.push(station);
        }

        if stations.is_empty() {
            return Err(StartupError::NoStations);
        }

        Ok(Self::from_stations(stations))
    }

    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Looks up a station by id. Returns `None` if not found.
    pub fn find(&self, station_id: &str) -> Option<&Arc<Station>> {
        self.stations.iter().find(|s| s.id == station_id)
    }

    /// Every series with a recognized kind, in station then series order.
    pub fn poll_targets(&self) -> Vec<PollTarget> {
        self.stations
            .iter()
            .flat_map(|station| {
                station.parameters.iter().filter_map(move |p| {
                    p.kind.map(|kind| PollTarget {
                        station: Arc::clone(station),
                        parameter: p.clone(),
                        kind,
                    })
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
