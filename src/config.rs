//! # Configuration Management

//! This module handles configuration loading for the AgriSense sensor simulator.
//! It leverages the `config` crate to merge settings from several sources, including:

//! * YAML configuration files (default.yaml, plus an optional file named after `RUN_MODE`)
//! * Environment variables prefixed with `APP`
//! * Command line overrides for the endpoint URL and the tick interval

//! The core of this module is the `Settings` struct, which is handed to the simulator at startup.

use serde::{Deserialize, Serialize};
use config::{Config, Environment, File};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use crate::errors::{SimulatorError, SimulatorResult};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/sensors/data";
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Represents the complete set of configuration settings for the simulator.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Where readings are sent and how often
    pub simulator: SimulatorSettings,
    /// Settings for application logging
    pub logging: LoggingSettings,
}

/// Holds the settings that drive the simulation loop
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulatorSettings {
    /// The ingestion endpoint every reading is POSTed to
    pub api_url: String,
    /// Seconds to sleep between two full sensor passes
    pub interval_secs: u64,
    /// Upper bound for a single POST, in seconds
    pub request_timeout_secs: u64,
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingSettings {
    /// The logging level (e.g., "info", "debug", "error"), used when `RUST_LOG` is not set
    pub level: String,
    /// The directory path where log files will be stored (optional)
    pub path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            simulator: SimulatorSettings {
                api_url: DEFAULT_API_URL.to_string(),
                interval_secs: DEFAULT_INTERVAL_SECS,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                path: None,
            },
        }
    }
}

impl SimulatorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// # Settings Initialization
impl Settings {
    /// Loads and constructs the application settings from various configuration sources.
    ///
    /// Sources, in increasing order of precedence:
    ///
    /// 1. Built-in defaults
    /// 2. `default.yaml` in `CONFIG_DIR` (defaults to "src/config"), optional
    /// 3. Environment-specific YAML file named after `RUN_MODE` (defaults to "development"), optional
    /// 4. Environment variables prefixed with `APP` (e.g., `APP__SIMULATOR__API_URL`)
    /// 5. The `api_url` and `interval_secs` overrides passed in by the caller
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)`: If the settings were loaded and passed validation
    /// * `Err(SimulatorError)`: If a source could not be read or a value is invalid
    pub fn load(api_url: Option<String>, interval_secs: Option<u64>) -> SimulatorResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "src/config".into());

        let mut builder = Config::builder()
            .set_default("simulator.api_url", DEFAULT_API_URL)?
            .set_default("simulator.interval_secs", DEFAULT_INTERVAL_SECS as i64)?
            .set_default("simulator.request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        if let Some(url) = api_url {
            builder = builder.set_override("simulator.api_url", url)?;
        }
        if let Some(secs) = interval_secs {
            builder = builder.set_override("simulator.interval_secs", secs as i64)?;
        }

        let s = builder.build()?;
        let mut s: Self = s.try_deserialize::<Settings>()
            .map_err(SimulatorError::from)?;

        if let Some(ref mut path) = s.logging.path {
            *path = env::current_dir()?.join(path.clone());
        }

        s.validate()?;
        Ok(s)
    }

    /// Rejects settings the simulator cannot run with.
    pub fn validate(&self) -> SimulatorResult<()> {
        let url = Url::parse(&self.simulator.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SimulatorError::ConfigError(format!(
                "api_url must use http or https, got {}", url.scheme()
            )));
        }
        if self.simulator.interval_secs == 0 {
            return Err(SimulatorError::ConfigError("interval_secs must be greater than zero".into()));
        }
        if self.simulator.request_timeout_secs == 0 {
            return Err(SimulatorError::ConfigError("request_timeout_secs must be greater than zero".into()));
        }
        Ok(())
    }
}
