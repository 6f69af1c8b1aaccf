use crate::error::ConfigError;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional; a missing `config.toml` section falls back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analytics: AnalyticsSettings,
    pub services: ServiceSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects values the rest of the system cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.history_limit must be greater than 0".to_string(),
            ));
        }
        if self.analytics.label_format.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "analytics.label_format must not be empty".to_string(),
            ));
        }
        if StrftimeItems::new(&self.analytics.label_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::ValidationError(format!(
                "analytics.label_format '{}' is not a valid strftime pattern",
                self.analytics.label_format
            )));
        }
        if self.services.busy_queue_threshold < 0 {
            return Err(ConfigError::ValidationError(
                "services.busy_queue_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for fetching and charting resource history.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// The maximum number of snapshots fetched from the history provider.
    pub history_limit: u32,
    /// The window used when none is given on the command line.
    pub default_window_days: u32,
    /// A `chrono` strftime pattern for chart labels.
    pub label_format: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            history_limit: 100,
            default_window_days: 7,
            label_format: "%d/%m %H:%M".to_string(),
        }
    }
}

/// Parameters for the service queue status policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// A queue longer than this marks an active service as busy.
    pub busy_queue_threshold: i32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            busy_queue_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            file_prefix: "pulse.log".to_string(),
        }
    }
}
