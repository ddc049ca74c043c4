/// Exporter configuration.
///
/// Resolved from four layers, lowest precedence first:
///   1. built-in defaults
///   2. optional TOML file (`nve_exporter.toml`, or `--config PATH`)
///   3. environment: `NVE_API_KEY`, `NVE_STATIONS` (a `.env` file is honored)
///   4. command-line flags
///
/// Everything downstream receives a validated `Config`; nothing reads the
/// environment after startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use argh::FromArgs;
use serde::Deserialize;

use crate::ingest::hydapi::DEFAULT_BASE_URL;
use crate::model::StartupError;
use crate::poller::PollerSettings;
use crate::stations::DEFAULT_METADATA_THROTTLE;

pub const DEFAULT_CONFIG_FILE: &str = "nve_exporter.toml";
pub const ENV_API_KEY: &str = "NVE_API_KEY";
pub const ENV_STATIONS: &str = "NVE_STATIONS";

/// Upper bounds accepted for the interval (one week) and the maximum
/// observation age (one year).
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
pub const MAX_AGE_HOURS: u64 = 366 * 24;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Prometheus exporter for NVE HydAPI station observations.
#[derive(Debug, Default, FromArgs)]
pub struct Args {
    /// NVE api key (default: $NVE_API_KEY)
    #[argh(option)]
    pub key: Option<String>,

    /// comma separated list of station ids (default: $NVE_STATIONS)
    #[argh(option)]
    pub stations: Option<String>,

    /// update interval in minutes (default: 10)
    #[argh(option)]
    pub interval: Option<u64>,

    /// maximum age of observation in hours to be included (default: 24)
    #[argh(option)]
    pub max_age: Option<u64>,

    /// address to serve /metrics on (default: 0.0.0.0:8080)
    #[argh(option)]
    pub listen: Option<String>,

    /// path to a TOML configuration file
    #[argh(option)]
    pub config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// File layer
// ---------------------------------------------------------------------------

/// Contents of the optional TOML file. Every field may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub stations: Option<Vec<String>>,
    pub interval_minutes: Option<u64>,
    pub max_age_hours: Option<u64>,
    pub listen: Option<String>,
    pub base_url: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub metadata_throttle_ms: Option<u64>,
    pub exit_delay_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, StartupError> {
        toml::from_str(contents).map_err(|e| StartupError::Config(format!("invalid TOML: {}", e)))
    }

    /// Reads `path`. A missing file is only an error when it was asked for
    /// explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Option<Self>, StartupError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents)
                .map(Some)
                .map_err(|e| StartupError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(None),
            Err(e) => Err(StartupError::Config(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment layer
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvConfig {
    pub api_key: Option<String>,
    pub stations: Option<String>,
}

impl EnvConfig {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: non_empty(ENV_API_KEY),
            stations: non_empty(ENV_STATIONS),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub station_ids: Vec<String>,
    /// Poll interval, minutes.
    pub interval_minutes: u64,
    /// Maximum observation age, hours.
    pub max_age_hours: u64,
    pub listen: String,
    pub base_url: String,
    pub fetch_timeout: Duration,
    /// Delay between successive metadata fetches and poller launches.
    pub metadata_throttle: Duration,
    /// Delay before exiting on a fatal startup error.
    pub exit_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            station_ids: Vec::new(),
            interval_minutes: 10,
            max_age_hours: 24,
            listen: "0.0.0.0:8080".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(10),
            metadata_throttle: DEFAULT_METADATA_THROTTLE,
            exit_delay: Duration::from_secs(10),
        }
    }
}

/// Splits a comma separated station list, dropping blanks.
pub fn parse_station_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Full startup resolution: file, `.env`/environment, then flags.
    pub fn load(args: &Args) -> Result<Self, StartupError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path, true)?,
            None => FileConfig::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
        };
        Self::from_layers(file, EnvConfig::from_env(), args)
    }

    /// Merges the layers over the defaults and validates the result.
    pub fn from_layers(file: Option<FileConfig>, env: EnvConfig, args: &Args) -> Result<Self, StartupError> {
        let mut config = Config::default();

        if let Some(file) = file {
            if let Some(v) = file.api_key {
                config.api_key = v;
            }
            if let Some(v) = file.stations {
                config.station_ids = v.iter().flat_map(|s| parse_station_list(s)).collect();
            }
            if let Some(v) = file.interval_minutes {
                config.interval_minutes = v;
            }
            if let Some(v) = file.max_age_hours {
                config.max_age_hours = v;
            }
            if let Some(v) = file.listen {
                config.listen = v;
            }
            if let Some(v) = file.base_url {
                config.base_url = v;
            }
            if let Some(v) = file.fetch_timeout_secs {
                config.fetch_timeout = Duration::from_secs(v);
            }
            if let Some(v) = file.metadata_throttle_ms {
                config.metadata_throttle = Duration::from_millis(v);
            }
            if let Some(v) = file.exit_delay_secs {
                config.exit_delay = Duration::from_secs(v);
            }
        }

        if let Some(v) = env.api_key {
            config.api_key = v;
        }
        if let Some(v) = env.stations {
            config.station_ids = parse_station_list(&v);
        }

        if let Some(v) = &args.key {
            config.api_key = v.clone();
        }
        if let Some(v) = &args.stations {
            config.station_ids = parse_station_list(v);
        }
        if let Some(v) = args.interval {
            config.interval_minutes = v;
        }
        if let Some(v) = args.max_age {
            config.max_age_hours = v;
        }
        if let Some(v) = &args.listen {
            config.listen = v.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        if self.api_key.trim().is_empty() {
            return Err(StartupError::Config(format!(
                "missing API key (set --key or {})",
                ENV_API_KEY
            )));
        }
        if self.station_ids.is_empty() {
            return Err(StartupError::Config(format!(
                "no station ids (set --stations or {})",
                ENV_STATIONS
            )));
        }
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.interval_minutes) {
            return Err(StartupError::Config(format!(
                "interval must be between 1 and {} minutes, got {}",
                MAX_INTERVAL_MINUTES, self.interval_minutes
            )));
        }
        if !(1..=MAX_AGE_HOURS).contains(&self.max_age_hours) {
            return Err(StartupError::Config(format!(
                "max age must be between 1 and {} hours, got {}",
                MAX_AGE_HOURS, self.max_age_hours
            )));
        }
        Ok(())
    }

    /// Timing for the pollers. Values beyond the validated bounds are
    /// clamped to them.
    pub fn poller_settings(&self) -> PollerSettings {
        let minutes = self.interval_minutes.min(MAX_INTERVAL_MINUTES);
        let hours = self.max_age_hours.min(MAX_AGE_HOURS);
        PollerSettings {
            interval: Duration::from_secs(minutes * 60),
            max_age: chrono::Duration::hours(hours as i64),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
