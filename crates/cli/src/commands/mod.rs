//! Command implementations.

mod plugins;
mod run;
mod validate;

pub use plugins::run_plugins;
pub use run::run_relay;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::RelayConfig;

use crate::error::CliError;

/// Load and validate the configuration file
///
/// A missing file is an error: nothing runs without configuration.
fn load_config(path: &Path) -> Result<RelayConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
