//! Shared setup for the sol-weld binaries

use anyhow::{Context, Result};
use sol_weld::WeldConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SOL_WELD_LOG";

/// Initialize tracing
///
/// `SOL_WELD_LOG` wins when set; otherwise the level is `info`, or `debug`
/// with the verbosity flag.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();
}

/// Load the configuration file if one was given
pub fn load_config(path: Option<&Path>) -> Result<WeldConfig> {
    WeldConfig::load_or_default(path).context("Failed to load configuration")
}
