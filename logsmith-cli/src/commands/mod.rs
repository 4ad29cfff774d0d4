//! Subcommand handlers

pub mod analyze;
pub mod config;
pub mod templates;

use std::path::Path;

use logsmith_core::config::LogsmithConfig;
use logsmith_core::error::{ConfigError, LogsmithError};

use crate::cli::DEFAULT_CONFIG_PATH;
use crate::error::CliError;

/// Load the configuration for a command.
///
/// A missing file at the *default* path falls back to built-in defaults
/// (plus env overrides) -- running `logsmith analyze x.log` outside a
/// project directory should just work. An explicitly given path must exist.
pub(crate) async fn load_config(path: &Path) -> Result<LogsmithConfig, CliError> {
    match LogsmithConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(LogsmithError::Config(ConfigError::FileNotFound { .. }))
            if path == Path::new(DEFAULT_CONFIG_PATH) =>
        {
            tracing::debug!("no logsmith.toml found, using built-in defaults");
            let mut config = LogsmithConfig::default();
            config.apply_env_overrides();
            config
                .validate()
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        }
        Err(e) => Err(CliError::Config(e.to_string())),
    }
}
