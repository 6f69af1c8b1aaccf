use clap::Args;
use std::path::PathBuf;

/// Command-line flags for locating and overriding the configuration.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Overrides `logging.filter` (e.g. "debug" or "analytics=trace").
    #[arg(long, global = true)]
    pub log_filter: Option<String>,
}
