//! Logsmith CLI entry point
//!
//! Parses arguments, initialises tracing (stderr, so stdout payloads stay
//! clean for piping), and dispatches to the subcommand handlers.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Best-effort config peek for logging defaults; commands load for real.
    let boot_config = commands::load_config(&cli.config).await.unwrap_or_default();
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| boot_config.general.log_level.clone());
    init_tracing(&level, boot_config.general.log_format == "json");

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, &cli.config, &writer).await,
        Commands::Templates(args) => commands::templates::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
