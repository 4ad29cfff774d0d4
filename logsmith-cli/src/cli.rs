//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "logsmith.toml";

/// Logsmith -- log normalization & event correlation engine.
///
/// Use `logsmith <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logsmith", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logsmith.toml configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full analysis pipeline on a log file.
    Analyze(AnalyzeArgs),

    /// Show mined templates and their occurrence counts.
    Templates(TemplatesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- analyze ----

/// Run normalization, template mining, extraction, classification,
/// session correlation and threat detection over one log file.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file to analyze.
    pub file: PathBuf,

    /// Drop housekeeping-service lines before analysis.
    #[arg(long)]
    pub filter_noise: bool,

    /// Override the threat detector's trailing window (minutes).
    #[arg(long)]
    pub threat_window_mins: Option<u64>,

    /// Override the threat detector's failure threshold.
    #[arg(long)]
    pub threat_threshold: Option<u64>,

    /// Anchor year to use when the log carries no explicit year.
    #[arg(long)]
    pub anchor_year: Option<i32>,
}

// ---- templates ----

/// Show the template clusters mined from one log file.
#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Log file to mine.
    pub file: PathBuf,

    /// Drop housekeeping-service lines before mining.
    #[arg(long)]
    pub filter_noise: bool,
}

// ---- config ----

/// Manage logsmith configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, noise, miner, session, threat).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_analyze_basic() {
        let args = Cli::try_parse_from(["logsmith", "analyze", "/var/log/messages"]);
        assert!(args.is_ok(), "should parse 'analyze' subcommand");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Analyze(analyze_args) => {
                assert_eq!(
                    analyze_args.file,
                    std::path::PathBuf::from("/var/log/messages")
                );
                assert!(!analyze_args.filter_noise);
                assert!(analyze_args.threat_window_mins.is_none());
                assert!(analyze_args.threat_threshold.is_none());
                assert!(analyze_args.anchor_year.is_none());
            }
            _ => panic!("expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_parse_analyze_with_overrides() {
        let args = Cli::try_parse_from([
            "logsmith",
            "analyze",
            "messages.log",
            "--filter-noise",
            "--threat-window-mins",
            "15",
            "--threat-threshold",
            "3",
            "--anchor-year",
            "2005",
        ]);
        assert!(args.is_ok(), "should parse analyze with overrides");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Analyze(analyze_args) => {
                assert!(analyze_args.filter_noise);
                assert_eq!(analyze_args.threat_window_mins, Some(15));
                assert_eq!(analyze_args.threat_threshold, Some(3));
                assert_eq!(analyze_args.anchor_year, Some(2005));
            }
            _ => panic!("expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_parse_analyze_requires_file() {
        let args = Cli::try_parse_from(["logsmith", "analyze"]);
        assert!(args.is_err(), "analyze without a file should fail");
    }

    #[test]
    fn test_cli_parse_templates() {
        let args = Cli::try_parse_from(["logsmith", "templates", "messages.log"]);
        assert!(args.is_ok(), "should parse 'templates' subcommand");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Templates(template_args) => {
                assert_eq!(template_args.file, std::path::PathBuf::from("messages.log"));
                assert!(!template_args.filter_noise);
            }
            _ => panic!("expected Templates command"),
        }
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let args = Cli::try_parse_from(["logsmith", "config", "validate"]);
        assert!(args.is_ok(), "should parse 'config validate' subcommand");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Validate => {}
                _ => panic!("expected Validate action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let args = Cli::try_parse_from(["logsmith", "config", "show", "--section", "threat"]);
        assert!(args.is_ok(), "should parse config show with section");
        let cli = args.expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section, Some("threat".to_owned()));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_custom_config_path() {
        let args = Cli::try_parse_from(["logsmith", "-c", "/custom/config.toml", "config", "validate"]);
        assert!(args.is_ok(), "should parse with custom config path");
        let cli = args.expect("parse succeeded");
        assert_eq!(cli.config, std::path::PathBuf::from("/custom/config.toml"));
    }

    #[test]
    fn test_cli_parse_log_level() {
        let args = Cli::try_parse_from(["logsmith", "--log-level", "debug", "templates", "a.log"]);
        assert!(args.is_ok(), "should parse with custom log level");
        let cli = args.expect("parse succeeded");
        assert_eq!(cli.log_level, Some("debug".to_owned()));
    }

    #[test]
    fn test_cli_parse_output_format_json() {
        let args = Cli::try_parse_from(["logsmith", "--output", "json", "templates", "a.log"]);
        assert!(args.is_ok(), "should parse with json output format");
        let cli = args.expect("parse succeeded");
        match cli.output {
            OutputFormat::Json => {}
            _ => panic!("expected Json output format"),
        }
    }

    #[test]
    fn test_cli_parse_invalid_command_fails() {
        let args = Cli::try_parse_from(["logsmith", "invalid-command"]);
        assert!(args.is_err(), "should fail on invalid command");
    }

    #[test]
    fn test_cli_parse_missing_command_fails() {
        let args = Cli::try_parse_from(["logsmith"]);
        assert!(args.is_err(), "should fail when no command provided");
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "logsmith");

        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(
            subcommands.contains(&"analyze"),
            "should have 'analyze' subcommand"
        );
        assert!(
            subcommands.contains(&"templates"),
            "should have 'templates' subcommand"
        );
        assert!(
            subcommands.contains(&"config"),
            "should have 'config' subcommand"
        );
    }
}
