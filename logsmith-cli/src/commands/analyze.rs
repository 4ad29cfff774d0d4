//! `logsmith analyze` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use logsmith_core::types::{Severity, ThreatCandidate};
use logsmith_engine::report::{AnalysisReport, AnalysisStats, SessionGroup};
use logsmith_engine::{AnalyzerConfig, LogAnalyzerBuilder};

use crate::cli::AnalyzeArgs;
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// How many template clusters the text report shows.
const TOP_TEMPLATES: usize = 10;

/// Execute the `analyze` command.
pub async fn execute(
    args: AnalyzeArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = load_config(config_path).await?;

    // CLI flags take precedence over the config file
    if args.filter_noise {
        config.noise.enabled = true;
    }
    if let Some(window) = args.threat_window_mins {
        config.threat.window_minutes = window;
    }
    if let Some(threshold) = args.threat_threshold {
        config.threat.max_retry = threshold;
    }
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let mut engine_config = AnalyzerConfig::from_core(&config);
    engine_config.fallback_year = args.anchor_year;

    let analyzer = LogAnalyzerBuilder::new().config(engine_config).build()?;
    info!(file = %args.file.display(), "starting analysis");
    let report = analyzer.analyze_file(&args.file)?;

    let payload = build_payload(&args.file.display().to_string(), report);
    writer.render(&payload)?;

    // Non-zero exit when threats were flagged, for scripting
    if !payload.threats.is_empty() {
        return Err(CliError::ThreatsFound(payload.threats.len()));
    }
    Ok(())
}

/// Per-severity record counts.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
}

/// One row of the template table.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntry {
    pub cluster_id: u64,
    pub occurrences: u64,
    pub template: String,
}

/// Full `analyze` output payload.
///
/// JSON output carries every structured record for downstream consumers;
/// the text rendering shows the aggregated views only.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzePayload {
    pub file: String,
    pub stats: AnalysisStats,
    pub severity_counts: SeverityCounts,
    pub top_templates: Vec<TemplateEntry>,
    pub sessions: Vec<SessionGroup>,
    pub threats: Vec<ThreatCandidate>,
    pub records: Vec<logsmith_core::types::LogRecord>,
}

fn build_payload(file: &str, report: AnalysisReport) -> AnalyzePayload {
    let mut severity_counts = SeverityCounts::default();
    for record in &report.records {
        match record.severity {
            Severity::Info => severity_counts.info += 1,
            Severity::Warning => severity_counts.warning += 1,
            Severity::Critical => severity_counts.critical += 1,
        }
    }

    let top_templates = report
        .clusters
        .iter()
        .take(TOP_TEMPLATES)
        .map(|c| TemplateEntry {
            cluster_id: c.cluster_id,
            occurrences: c.occurrences,
            template: c.template.clone(),
        })
        .collect();

    AnalyzePayload {
        file: file.to_owned(),
        stats: report.stats,
        severity_counts,
        top_templates,
        sessions: report.sessions,
        threats: report.threats,
        records: report.records,
    }
}

impl Render for AnalyzePayload {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", "Analysis Summary".bold())?;
        writeln!(w, "  File:             {}", self.file)?;
        writeln!(
            w,
            "  Lines analyzed:   {} of {} ({} noise-filtered)",
            self.stats.analyzed, self.stats.total_lines, self.stats.noise_filtered,
        )?;
        writeln!(w, "  Unique templates: {}", self.stats.unique_templates)?;
        writeln!(
            w,
            "  Anchor year:      {} ({})",
            self.stats.anchor_year,
            if self.stats.anchor_from_logs {
                "from logs"
            } else {
                "system fallback"
            },
        )?;
        if self.stats.rollover_detected {
            writeln!(w, "  Rollover:         Dec -> Jan boundary corrected")?;
        }
        if self.stats.unresolved_timestamps > 0 {
            writeln!(
                w,
                "  Unresolved times: {}",
                self.stats.unresolved_timestamps,
            )?;
        }
        writeln!(
            w,
            "  Severity:         {} info / {} warning / {} critical",
            self.severity_counts.info,
            self.severity_counts.warning,
            self.severity_counts.critical,
        )?;

        writeln!(w)?;
        writeln!(w, "{}", "Top Templates".bold())?;
        for entry in &self.top_templates {
            writeln!(
                w,
                "  #{:<4} {:>5}x  {}",
                entry.cluster_id, entry.occurrences, entry.template,
            )?;
        }

        writeln!(w)?;
        writeln!(w, "{}", "Sessions".bold())?;
        if self.sessions.is_empty() {
            writeln!(w, "  no login/logout activity detected")?;
        }
        for group in &self.sessions {
            writeln!(
                w,
                "  {} @ {} ({} session(s))",
                group.user.bold(),
                group.service,
                group.count,
            )?;
            for session in &group.sessions {
                match (&session.end, &session.duration) {
                    (Some(end), Some(duration)) => writeln!(
                        w,
                        "    {} -> {}  {}",
                        session.start.format("%Y-%m-%d %H:%M"),
                        end.format("%H:%M"),
                        duration,
                    )?,
                    _ => writeln!(
                        w,
                        "    {} -> ...  {}",
                        session.start.format("%Y-%m-%d %H:%M"),
                        session.status,
                    )?,
                }
            }
        }

        writeln!(w)?;
        writeln!(w, "{}", "Threat Candidates".bold())?;
        if self.threats.is_empty() {
            writeln!(w, "  {}", "none".green())?;
        } else {
            writeln!(
                w,
                "  {:<42} {:<20} {:>6} {:>6}",
                "HOST", "TRIGGERED", "BURST", "TOTAL",
            )?;
            for threat in &self.threats {
                writeln!(
                    w,
                    "  {:<42} {:<20} {:>6} {:>6}",
                    threat.host.red(),
                    threat.triggered_at.format("%Y-%m-%d %H:%M:%S"),
                    threat.max_burst,
                    threat.total_failures,
                )?;
            }
        }
        Ok(())
    }
}
