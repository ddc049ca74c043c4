/// nve_exporter: Prometheus exporter for NVE HydAPI hydrological stations.
///
/// # Module structure
///
/// ```text
/// nve_exporter
/// ├── model       - shared data types (Station, ParameterKind, MeasurementRecord, errors)
/// ├── config      - layered configuration (defaults, TOML file, environment, flags)
/// ├── stations    - station registry loaded from HydAPI metadata at startup
/// ├── validity    - freshness and plausibility rules for observations
/// ├── ingest
/// │   ├── fetch   - authenticated HTTP GET behind the `Fetch` trait
/// │   ├── hydapi  - HydAPI URL construction + JSON parsing
/// │   └── fixtures (test only) - representative API response payloads
/// ├── monitor     - snapshot store of the latest record per series
/// ├── poller      - per-series polling task
/// ├── shutdown    - shared stop signal for pollers and the endpoint
/// ├── exporter    - Prometheus text rendering
/// ├── endpoint    - HTTP server for /metrics and /health
/// └── daemon      - startup, poller launch, shutdown
/// ```

/// Public modules
pub mod config;
pub mod daemon;
pub mod endpoint;
pub mod exporter;
pub mod ingest;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod shutdown;
pub mod stations;
pub mod validity;
