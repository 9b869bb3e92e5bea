//! Application settings loaded from `config.toml`.
//!
//! Every key is optional. Values the scheduler cannot use (zero or negative interval or
//! horizon) are kept as written and replaced with safe defaults by
//! [`SchedulerConfig::normalized`]. A file that cannot be read or parsed is logged and
//! replaced by the defaults in [`load_default_settings`], so a bad file never prevents
//! startup.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Months of projections kept materialized when no usable horizon is configured.
pub const DEFAULT_MONTHS_AHEAD: i32 = 12;

/// Largest horizon ever generated, fifty years. Larger requests are capped.
pub const MAX_MONTHS_AHEAD: i32 = 600;

/// Scheduler tick period when no usable interval is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Background projection scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// `[scheduler]` section of config.toml
#[derive(Debug, Default, Deserialize, Clone, Copy)]
pub struct SchedulerSettings {
    /// Seconds between scheduler ticks
    #[serde(default)]
    pub interval_secs: i64,
    /// Number of months kept materialized ahead of the current month
    #[serde(default)]
    pub months_ahead: i32,
}

impl SchedulerSettings {
    /// Converts the raw file values into a scheduler configuration.
    #[must_use]
    pub fn to_scheduler_config(self) -> SchedulerConfig {
        let interval = u64::try_from(self.interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(Duration::ZERO);
        SchedulerConfig::new(interval, self.months_ahead)
    }
}

/// Interval and horizon used by the projection scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between two ticks
    pub interval: Duration,
    /// Months generated on each tick, counting the current month
    pub months_ahead: i32,
}

impl SchedulerConfig {
    /// Creates a configuration as given; see [`normalized`](Self::normalized) for the
    /// values the scheduler actually uses.
    #[must_use]
    pub const fn new(interval: Duration, months_ahead: i32) -> Self {
        Self {
            interval,
            months_ahead,
        }
    }

    /// Returns the effective configuration: a zero interval becomes one hour, a
    /// non-positive horizon becomes twelve months and a horizon beyond
    /// [`MAX_MONTHS_AHEAD`] is capped.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            interval: if self.interval.is_zero() {
                DEFAULT_INTERVAL
            } else {
                self.interval
            },
            months_ahead: if self.months_ahead <= 0 {
                DEFAULT_MONTHS_AHEAD
            } else {
                self.months_ahead.min(MAX_MONTHS_AHEAD)
            },
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_MONTHS_AHEAD)
    }
}

/// Parses settings from a TOML string.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is malformed or a value has the wrong type.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML syntax is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `path`, using the defaults when the file is missing and logging
/// and ignoring a file that cannot be read or parsed.
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Settings {
    let path = path.as_ref();
    if !path.exists() {
        info!("No {} found, using default settings", path.display());
        return Settings::default();
    }
    load_settings(path).unwrap_or_else(|e| {
        warn!("Ignoring {}, using default settings: {e}", path.display());
        Settings::default()
    })
}

/// Loads `./config.toml` the way [`load_settings_or_default`] does.
#[must_use]
pub fn load_default_settings() -> Settings {
    load_settings_or_default("config.toml")
}
