/// NVE HydAPI client.
///
/// Handles URL construction and JSON response parsing for the two calls
/// this service makes:
///   https://hydapi.nve.no/api/v1/Stations
///   https://hydapi.nve.no/api/v1/Observations
///
/// See `fixtures.rs` for annotated examples of both response shapes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ingest::fetch::Fetch;
use crate::model::{FetchError, Observation, ParameterDescriptor, ParameterKind, Station};

pub const DEFAULT_BASE_URL: &str = "https://hydapi.nve.no/api/v1";

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct StationsResponse {
    #[serde(default)]
    data: Vec<StationData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationData {
    station_id: String,
    station_name: String,
    masl: Option<f64>,
    #[serde(alias = "LakeName")]
    lake_name: Option<String>,
    river_name: Option<String>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    series_list: Vec<SeriesData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesData {
    parameter_name: String,
    parameter: u32,
    #[serde(default)]
    unit: String,
}

#[derive(Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    data: Vec<ObservationSeries>,
}

#[derive(Deserialize)]
struct ObservationSeries {
    #[serde(default)]
    observations: Vec<ObservationEntry>,
}

#[derive(Deserialize)]
struct ObservationEntry {
    time: DateTime<Utc>,
    value: Option<f64>,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Station metadata URL for one station id.
pub fn build_station_url(base_url: &str, station_id: &str) -> String {
    format!(
        "{}/Stations?StationId={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(station_id)
    )
}

/// Latest-observation URL for one station/parameter. `ResolutionTime=0`
/// asks for instantaneous values; with no reference time HydAPI returns
/// only the most recent sample.
pub fn build_observation_url(base_url: &str, station_id: &str, parameter: u32) -> String {
    format!(
        "{}/Observations?StationId={}&ResolutionTime=0&Parameter={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(station_id),
        parameter
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Parses a `/Stations` response into a `Station`.
///
/// Missing elevation is read as sea level (0 m).
///
/// # Errors
/// - `FetchError::Decode` - malformed or unexpected JSON.
/// - `FetchError::NoData` - empty `data` array (unknown station id).
pub fn parse_station_response(json: &str, station_id: &str) -> Result<Station, FetchError> {
    let response: StationsResponse = serde_json::from_str(json)
        .map_err(|e| FetchError::Decode(format!("station {}: {}", station_id, e)))?;

    let data = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NoData(format!("station {} not found", station_id)))?;

    let parameters = data
        .series_list
        .into_iter()
        .map(|s| ParameterDescriptor {
            kind: ParameterKind::resolve(&s.parameter_name, s.parameter),
            code: s.parameter,
            name: s.parameter_name,
            unit: s.unit,
        })
        .collect();

    Ok(Station {
        id: data.station_id,
        name: data.station_name,
        masl: data.masl.unwrap_or(0.0),
        lake: blank_to_none(data.lake_name),
        river: blank_to_none(data.river_name),
        latitude: data.latitude,
        longitude: data.longitude,
        parameters,
    })
}

/// Parses an `/Observations` response into the latest observation.
///
/// # Errors
/// - `FetchError::Decode` - malformed JSON or unparseable timestamp.
/// - `FetchError::NoData` - no series, no observations, or a null value.
pub fn parse_observation_response(json: &str) -> Result<Observation, FetchError> {
    let response: ObservationsResponse =
        serde_json::from_str(json).map_err(|e| FetchError::Decode(e.to_string()))?;

    let series = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NoData("no series in response".to_string()))?;

    let latest = series
        .observations
        .into_iter()
        .max_by_key(|o| o.time)
        .ok_or_else(|| FetchError::NoData("no observations in series".to_string()))?;

    let value = latest
        .value
        .ok_or_else(|| FetchError::NoData(format!("null value at {}", latest.time)))?;

    Ok(Observation {
        value,
        observed_at: latest.time,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HydAPI calls over a shared `Fetch`.
pub struct HydApi {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
}

impl HydApi {
    pub fn new(fetcher: Arc<dyn Fetch>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches metadata for one station.
    pub fn station(&self, station_id: &str) -> Result<Station, FetchError> {
        let body = self.fetcher.get(&build_station_url(&self.base_url, station_id))?;
        parse_station_response(&body, station_id)
    }

    /// Fetches the most recent observation of one parameter.
    pub fn latest_observation(&self, station_id: &str, parameter: u32) -> Result<Observation, FetchError> {
        let body = self
            .fetcher
            .get(&build_observation_url(&self.base_url, station_id, parameter))?;
        parse_observation_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use chrono::TimeZone;

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_station_url_targets_stations_endpoint() {
        let url = build_station_url(DEFAULT_BASE_URL, "2.11.0");
        assert_eq!(url, "https://hydapi.nve.no/api/v1/Stations?StationId=2.11.0");
    }

    #[test]
    fn test_observation_url_requests_instantaneous_latest_value() {
        let url = build_observation_url(DEFAULT_BASE_URL, "2.11.0", 1000);
        assert!(url.starts_with("https://hydapi.nve.no/api/v1/Observations?"));
        assert!(url.contains("StationId=2.11.0"));
        assert!(url.contains("ResolutionTime=0"));
        assert!(url.contains("Parameter=1000"));
        assert!(!url.contains("ReferenceTime"), "no history should be requested");
    }

    #[test]
    fn test_urls_tolerate_trailing_slash_and_encode_ids() {
        let url = build_station_url("http://localhost:8000/api/v1/", "2.11 0&x");
        assert_eq!(url, "http://localhost:8000/api/v1/Stations?StationId=2.11%200%26x");
    }

    // --- Station parsing ----------------------------------------------------

    #[test]
    fn test_parse_station_identity() {
        let station = parse_station_response(fixture_station_narsjo_json(), "2.11.0")
            .expect("valid fixture should parse");

        assert_eq!(station.id, "2.11.0");
        assert_eq!(station.name, "Narsjø");
        assert_eq!(station.masl, 737.0);
        assert_eq!(station.lake.as_deref(), Some("Narsjøen"));
        assert_eq!(station.river.as_deref(), Some("GLOMMA"));
        assert!((station.latitude - 62.35328).abs() < 1e-9);
        assert!((station.longitude - 11.45421).abs() < 1e-9);
    }

    #[test]
    fn test_parse_station_keeps_unrecognized_series() {
        let station = parse_station_response(fixture_station_narsjo_json(), "2.11.0").unwrap();

        assert_eq!(station.parameters.len(), 3, "all series are kept for display");
        assert_eq!(station.parameters[0].kind, Some(ParameterKind::WaterLevel));
        assert_eq!(station.parameters[1].kind, Some(ParameterKind::AirTemperature));
        assert_eq!(station.parameters[1].unit, "°C");
        assert_eq!(station.parameters[2].kind, None);
        assert_eq!(station.parameters[2].name, "Snødybde");
    }

    #[test]
    fn test_parse_station_null_lake_is_none() {
        let station = parse_station_response(fixture_station_coastal_json(), "12.209.0").unwrap();
        assert_eq!(station.lake, None);
        assert_eq!(station.masl, 4.0);
        assert_eq!(station.parameters[1].kind, Some(ParameterKind::WaterFlow));
    }

    #[test]
    fn test_parse_station_sparse_metadata() {
        let station = parse_station_response(fixture_station_sparse_json(), "7.3.0").unwrap();
        assert_eq!(station.masl, 0.0);
        assert_eq!(station.lake, None);
        assert_eq!(station.river, None);
        assert!(station.parameters.is_empty());
    }

    #[test]
    fn test_parse_unknown_station_is_no_data() {
        let result = parse_station_response(fixture_station_unknown_json(), "99.99.0");
        assert!(
            matches!(result, Err(FetchError::NoData(ref msg)) if msg.contains("99.99.0")),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_parse_station_malformed_json_is_decode_error() {
        let result = parse_station_response("{ not json", "2.11.0");
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    // --- Observation parsing ------------------------------------------------

    #[test]
    fn test_parse_observation_value_and_time() {
        let obs = parse_observation_response(fixture_observation_water_level_json())
            .expect("valid fixture should parse");
        assert!((obs.value - 2.314).abs() < 1e-9);
        assert_eq!(obs.observed_at, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_observation_picks_latest_sample() {
        let obs = parse_observation_response(fixture_observation_two_samples_json()).unwrap();
        assert_eq!(obs.value, 12.5);
    }

    #[test]
    fn test_parse_empty_observations_is_no_data() {
        let result = parse_observation_response(fixture_observation_empty_json());
        assert!(matches!(result, Err(FetchError::NoData(_))), "got {:?}", result);
    }

    #[test]
    fn test_parse_null_value_is_no_data() {
        let result = parse_observation_response(fixture_observation_null_value_json());
        assert!(matches!(result, Err(FetchError::NoData(_))), "got {:?}", result);
    }

    #[test]
    fn test_parse_empty_data_array_is_no_data() {
        let result = parse_observation_response(r#"{ "data": [] }"#);
        assert!(matches!(result, Err(FetchError::NoData(_))));
    }

    #[test]
    fn test_parse_observation_bad_timestamp_is_decode_error() {
        let json = r#"{ "data": [{ "observations": [{ "time": "yesterday", "value": 1.0 }] }] }"#;
        let result = parse_observation_response(json);
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_parse_empty_string_is_decode_error() {
        assert!(matches!(parse_observation_response(""), Err(FetchError::Decode(_))));
    }
}
