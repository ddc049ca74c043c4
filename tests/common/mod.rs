//! Shared helpers for integration tests: a scripted `Fetch` and HydAPI
//! payload builders.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use nve_exporter::ingest::fetch::Fetch;
use nve_exporter::model::FetchError;

pub const BASE_URL: &str = "http://hydapi.test/api/v1";

/// Answers requests from per-URL queues. The last queued response for a
/// URL is repeated once the queue drains. Unknown URLs get a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: String, response: Result<String, FetchError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push_back(response);
    }

    pub fn station(&self, station_id: &str, body: String) {
        self.push(
            nve_exporter::ingest::hydapi::build_station_url(BASE_URL, station_id),
            Ok(body),
        );
    }

    pub fn observation(&self, station_id: &str, parameter: u32, response: Result<String, FetchError>) {
        self.push(
            nve_exporter::ingest::hydapi::build_observation_url(BASE_URL, station_id, parameter),
            response,
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetch for ScriptedFetcher {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Err(FetchError::Http(404))),
            None => Err(FetchError::Http(404)),
        }
    }
}

/// `/Stations` body for one station with the given (name, code) series.
pub fn station_json(station_id: &str, masl: f64, series: &[(&str, u32)]) -> String {
    let series: Vec<serde_json::Value> = series
        .iter()
        .map(|(name, code)| {
            serde_json::json!({ "parameterName": name, "parameter": code, "unit": "x" })
        })
        .collect();
    serde_json::json!({
        "data": [{
            "stationId": station_id,
            "stationName": format!("Station {}", station_id),
            "latitude": 60.0,
            "longitude": 10.0,
            "masl": masl,
            "lakeName": null,
            "riverName": "Testelva",
            "seriesList": series
        }]
    })
    .to_string()
}

/// `/Observations` body holding one sample.
pub fn observation_json(value: f64, time: DateTime<Utc>) -> String {
    serde_json::json!({
        "data": [{
            "stationId": "ignored",
            "observations": [{ "time": time.to_rfc3339(), "value": value, "correction": 0, "quality": 2 }]
        }]
    })
    .to_string()
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::hours(hours)
}
