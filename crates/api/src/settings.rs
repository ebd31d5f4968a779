//! Service Settings
//!
//! Layered configuration: built-in defaults, then an optional
//! `config/alert-engine.toml`, then `ALERT_ENGINE__*` environment variables
//! (e.g. `ALERT_ENGINE__SERVER__ADDR=0.0.0.0:9000`).

use alerting::LifecycleConfig;
use analytics::StatsWindow;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitConfig;

/// Default location of the settings file, without extension
pub const DEFAULT_CONFIG_PATH: &str = "config/alert-engine";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ALERT_ENGINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
    /// Requests still running after this many seconds are answered with 408.
    /// Bulk requests are exempt and bounded by `BulkSettings` instead.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Background refresh period; 0 disables the refresh task
    pub refresh_secs: u64,
    pub window: StatsWindow,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_secs: 30,
            window: StatsWindow::Last24Hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkSettings {
    /// Largest id list one bulk request may carry
    pub max_ids: usize,
    /// Transitions of one batch running at the same time
    pub max_in_flight: usize,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            max_ids: 1000,
            max_in_flight: alerting::DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub rate_limit: RateLimitConfig,
    pub lifecycle: LifecycleConfig,
    pub bulk: BulkSettings,
    pub dashboard: DashboardSettings,
}

impl Settings {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path` (any format `config` understands) and the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
