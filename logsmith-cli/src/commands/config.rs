//! `logsmith config` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use logsmith_core::config::LogsmithConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => {
            // Validation wants the real file -- no default fallback here.
            LogsmithConfig::load(config_path)
                .await
                .map_err(|e| CliError::Config(e.to_string()))?;
            let payload = ValidatePayload {
                path: config_path.display().to_string(),
                valid: true,
            };
            writer.render(&payload)?;
            Ok(())
        }
        ConfigAction::Show { section } => {
            let config = load_config(config_path).await?;
            let value = toml::Value::try_from(&config)
                .map_err(|e| CliError::Command(format!("failed to serialize config: {e}")))?;
            let value = match &section {
                Some(name) => value
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CliError::Command(format!("unknown config section: {name}")))?,
                None => value,
            };
            let payload = ShowPayload {
                path: config_path.display().to_string(),
                section,
                config: value,
            };
            writer.render(&payload)?;
            Ok(())
        }
    }
}

/// `config validate` output payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatePayload {
    pub path: String,
    pub valid: bool,
}

impl Render for ValidatePayload {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} configuration valid: {}", "✓".green(), self.path)
    }
}

/// `config show` output payload -- the effective configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ShowPayload {
    pub path: String,
    pub section: Option<String>,
    pub config: toml::Value,
}

impl Render for ShowPayload {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let rendered = toml::to_string_pretty(&self.config).map_err(std::io::Error::other)?;
        write!(w, "{rendered}")
    }
}
