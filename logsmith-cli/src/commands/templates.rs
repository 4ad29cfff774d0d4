//! `logsmith templates` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use logsmith_core::types::TemplateCluster;
use logsmith_engine::{AnalyzerConfig, LogAnalyzerBuilder};

use crate::cli::TemplatesArgs;
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `templates` command.
pub async fn execute(
    args: TemplatesArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = load_config(config_path).await?;
    if args.filter_noise {
        config.noise.enabled = true;
    }

    let analyzer = LogAnalyzerBuilder::new()
        .config(AnalyzerConfig::from_core(&config))
        .build()?;
    let report = analyzer.analyze_file(&args.file)?;

    let payload = TemplatesPayload {
        file: args.file.display().to_string(),
        total_lines: report.stats.total_lines,
        unique_templates: report.stats.unique_templates,
        clusters: report.clusters,
    };
    writer.render(&payload)?;
    Ok(())
}

/// `templates` output payload -- cluster table, occurrences descending.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatesPayload {
    pub file: String,
    pub total_lines: usize,
    pub unique_templates: usize,
    pub clusters: Vec<TemplateCluster>,
}

impl Render for TemplatesPayload {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", "Template Summary".bold())?;
        writeln!(w, "  File:             {}", self.file)?;
        writeln!(w, "  Lines:            {}", self.total_lines)?;
        writeln!(w, "  Unique templates: {}", self.unique_templates)?;
        writeln!(w)?;
        writeln!(w, "  {:<6} {:>6}  {}", "ID", "COUNT", "TEMPLATE")?;
        for cluster in &self.clusters {
            writeln!(
                w,
                "  #{:<5} {:>5}x  {}",
                cluster.cluster_id, cluster.occurrences, cluster.template,
            )?;
        }
        Ok(())
    }
}
