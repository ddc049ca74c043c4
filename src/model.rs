/// Core data types for the NVE HydAPI exporter.
///
/// This module defines the shared domain model imported by all other modules:
/// stations and their parameter descriptors, the closed set of parameter
/// kinds (with the table that drives validation and metric naming), the
/// record kept per polled series, and the error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::validity::DomainRule;

// ---------------------------------------------------------------------------
// Parameter kinds
// ---------------------------------------------------------------------------

/// The physical quantities this service knows how to poll and export.
///
/// Parameters reported by a station outside this set are kept in the
/// station metadata but never polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    WaterLevel,
    WaterFlow,
    AirTemperature,
    AirHumidity,
    WaterTemperature,
    WindDirection,
    WindSpeed,
}

/// One row of the kind table: how a kind is recognized upstream, which
/// domain rule applies to it and which metric it is exported under.
#[derive(Debug)]
pub struct KindSpec {
    pub kind: ParameterKind,
    /// `parameterName` as reported by HydAPI.
    pub upstream_name: &'static str,
    /// Canonical HydAPI parameter code.
    pub code: u32,
    pub metric: &'static str,
    pub help: &'static str,
    pub rule: DomainRule,
}

/// Elevation (m a.s.l.) above which a non-positive water level is treated
/// as a sensor fault.
pub const WATER_LEVEL_MIN_ELEVATION_M: f64 = 10.0;

/// Adding a kind means adding a variant above and a row here, in the same
/// position.
pub static KIND_TABLE: &[KindSpec] = &[
    KindSpec {
        kind: ParameterKind::WaterLevel,
        upstream_name: "Vannstand",
        code: 1000,
        metric: "nve_station_water_level",
        help: "Waterlevel",
        rule: DomainRule::PositiveAboveElevation {
            elevation_m: WATER_LEVEL_MIN_ELEVATION_M,
        },
    },
    KindSpec {
        kind: ParameterKind::WaterFlow,
        upstream_name: "Vannføring",
        code: 1001,
        metric: "nve_station_water_flow",
        help: "Water flow",
        rule: DomainRule::Positive,
    },
    KindSpec {
        kind: ParameterKind::AirTemperature,
        upstream_name: "Lufttemperatur",
        code: 17,
        metric: "nve_station_air_temperature",
        help: "Air temperature",
        rule: DomainRule::Any,
    },
    KindSpec {
        kind: ParameterKind::AirHumidity,
        upstream_name: "Relativ luftfuktighet",
        code: 2,
        metric: "nve_station_air_humidity",
        help: "Air humidity",
        rule: DomainRule::Any,
    },
    KindSpec {
        kind: ParameterKind::WaterTemperature,
        upstream_name: "Vanntemperatur",
        code: 1003,
        metric: "nve_station_water_temperature",
        help: "Water temperature",
        rule: DomainRule::Any,
    },
    KindSpec {
        kind: ParameterKind::WindDirection,
        upstream_name: "Vindretning",
        code: 14,
        metric: "nve_station_wind_direction",
        help: "Wind direction",
        rule: DomainRule::Any,
    },
    KindSpec {
        kind: ParameterKind::WindSpeed,
        upstream_name: "Vindhastighet",
        code: 15,
        metric: "nve_station_wind_speed",
        help: "Wind speed",
        rule: DomainRule::Any,
    },
];

impl ParameterKind {
    /// Table row for this kind.
    pub fn spec(self) -> &'static KindSpec {
        // Rows are in declaration order.
        &KIND_TABLE[self as usize]
    }

    /// Resolves a kind from an upstream series, matching the parameter
    /// name first and falling back to the canonical code.
    pub fn resolve(upstream_name: &str, code: u32) -> Option<Self> {
        KIND_TABLE
            .iter()
            .find(|s| s.upstream_name == upstream_name)
            .or_else(|| KIND_TABLE.iter().find(|s| s.code == code))
            .map(|s| s.kind)
    }

    pub fn metric(self) -> &'static str {
        self.spec().metric
    }

    pub fn rule(self) -> DomainRule {
        self.spec().rule
    }
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// A parameter (time series) reported by a station.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub code: u32,
    pub name: String,
    pub unit: String,
    /// `None` for parameters outside the recognized set.
    pub kind: Option<ParameterKind>,
}

/// Identity and metadata for a single HydAPI station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// HydAPI station id, e.g. "2.11.0".
    pub id: String,
    pub name: String,
    /// Elevation in meters above sea level.
    pub masl: f64,
    pub lake: Option<String>,
    pub river: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub parameters: Vec<ParameterDescriptor>,
}

// ---------------------------------------------------------------------------
// Observations and records
// ---------------------------------------------------------------------------

/// A single timestamped value returned by one fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

/// Key of the snapshot store: one polled series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub station_id: String,
    pub parameter: u32,
}

impl SeriesKey {
    pub fn new(station_id: &str, parameter: u32) -> Self {
        Self {
            station_id: station_id.to_string(),
            parameter,
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.station_id, self.parameter)
    }
}

/// Latest attempted observation for one series.
///
/// Always replaced as a whole; an invalid reading overwrites a previous
/// valid one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRecord {
    pub value: f64,
    pub valid: bool,
    /// `None` until the first successful fetch.
    pub observed_at: Option<DateTime<Utc>>,
}

impl MeasurementRecord {
    /// Record seeded before the first poll completes.
    pub fn pending() -> Self {
        Self {
            value: 0.0,
            valid: false,
            observed_at: None,
        }
    }

    pub fn from_observation(observation: &Observation, valid: bool) -> Self {
        Self {
            value: observation.value,
            valid,
            observed_at: Some(observation.observed_at),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or decoding HydAPI data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure.
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The response body could not be deserialized.
    #[error("decode error: {0}")]
    Decode(String),
    /// The payload was well formed but held no usable station/observation.
    #[error("no data: {0}")]
    NoData(String),
}

/// Unrecoverable failures during startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to load station {station_id}: {source}")]
    Metadata {
        station_id: String,
        #[source]
        source: FetchError,
    },
    #[error("no stations configured")]
    NoStations,
    #[error("failed to start HTTP listener on {addr}: {reason}")]
    Listen { addr: String, reason: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
