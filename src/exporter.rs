/// Prometheus rendering of the current station state.
///
/// Pull-triggered: `render` runs once per scrape on the endpoint thread,
/// against a snapshot of the store taken by the caller. It never touches
/// the network.
///
/// Metrics:
/// * `nve_station_info{station_id, name, lake, river, masl, latitude, longitude}` - always 1
/// * one gauge per parameter kind (see `model::KIND_TABLE`), labeled by
///   `station_id`, emitted only for records currently flagged valid
///
/// An invalid or never-populated series produces no sample at all, so a
/// stale sensor is distinguishable from one reading zero.

use std::collections::HashMap;

use prometheus::{Encoder, GaugeVec, Opts, Registry as MetricRegistry, TextEncoder};
use thiserror::Error;

use crate::model::{KIND_TABLE, MeasurementRecord, ParameterKind, SeriesKey, Station};
use crate::stations::Registry;

pub const STATION_INFO_METRIC: &str = "nve_station_info";

const LABEL_STATION_ID: &str = "station_id";
const INFO_LABELS: [&str; 7] = [
    LABEL_STATION_ID,
    "name",
    "lake",
    "river",
    "masl",
    "latitude",
    "longitude",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("metric error: {0}")]
    Metric(#[from] prometheus::Error),
    #[error("rendered metrics are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Content type of the rendered text.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

fn station_info_labels(station: &Station) -> [String; 7] {
    [
        station.id.clone(),
        station.name.clone(),
        station.lake.clone().unwrap_or_default(),
        station.river.clone().unwrap_or_default(),
        format!("{}", station.masl),
        format!("{:.6}", station.latitude),
        format!("{:.6}", station.longitude),
    ]
}

/// Renders every station's info sample and every valid record in the
/// text exposition format.
pub fn render(
    registry: &Registry,
    snapshot: &HashMap<SeriesKey, MeasurementRecord>,
) -> Result<String, ExportError> {
    let metrics = MetricRegistry::new();

    let info = GaugeVec::new(Opts::new(STATION_INFO_METRIC, "Station info"), &INFO_LABELS)?;
    metrics.register(Box::new(info.clone()))?;

    let mut gauges: HashMap<ParameterKind, GaugeVec> = HashMap::new();
    for spec in KIND_TABLE {
        let gauge = GaugeVec::new(Opts::new(spec.metric, spec.help), &[LABEL_STATION_ID])?;
        metrics.register(Box::new(gauge.clone()))?;
        gauges.insert(spec.kind, gauge);
    }

    for station in registry.stations() {
        let labels = station_info_labels(station);
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        info.with_label_values(&label_refs).set(1.0);

        for parameter in &station.parameters {
            let Some(kind) = parameter.kind else {
                continue;
            };
            let key = SeriesKey::new(&station.id, parameter.code);
            match snapshot.get(&key) {
                Some(record) if record.valid => {
                    if let Some(gauge) = gauges.get(&kind) {
                        gauge.with_label_values(&[station.id.as_str()]).set(record.value);
                    }
                }
                _ => {}
            }
        }
    }

    // Families without samples are pruned by gather().
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
