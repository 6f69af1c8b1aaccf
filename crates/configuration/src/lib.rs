use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::ConfigArgs;
pub use logging::init_tracing;
pub use settings::{AnalyticsSettings, Config, LoggingSettings, ServiceSettings};

/// Loads the application configuration from a TOML file.
///
/// The file is optional: a missing file yields the defaults. Values can be
/// overridden with `PULSE__<SECTION>__<KEY>` environment variables, e.g.
/// `PULSE__ANALYTICS__HISTORY_LIMIT=200`. The result is validated before it
/// is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("PULSE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    finish(builder)
}

/// Parses a configuration from TOML text, without environment overrides.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.analytics.history_limit, 100);
        assert_eq!(config.analytics.default_window_days, 7);
        assert_eq!(config.analytics.label_format, "%d/%m %H:%M");
        assert_eq!(config.services.busy_queue_threshold, 5);
        assert_eq!(config.logging.filter, "info");
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = parse_config(
            r#"
            [analytics]
            history_limit = 250

            [logging]
            directory = "logs"
            "#,
        )
        .unwrap();
        assert_eq!(config.analytics.history_limit, 250);
        assert_eq!(config.analytics.default_window_days, 7);
        assert_eq!(config.logging.directory.as_deref(), Some(Path::new("logs")));
        assert_eq!(config.logging.file_prefix, "pulse.log");
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let err = parse_config("[analytics]\nhistory_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unparsable_label_format_is_rejected() {
        let err = parse_config("[analytics]\nlabel_format = \"%Q\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("%Q")));

        let config = parse_config("[analytics]\nlabel_format = \"%Y-%m-%d\"\n").unwrap();
        assert_eq!(config.analytics.label_format, "%Y-%m-%d");
    }

    #[test]
    fn negative_busy_threshold_is_rejected() {
        let err = parse_config("[services]\nbusy_queue_threshold = -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.analytics.history_limit, 100);
    }
}
