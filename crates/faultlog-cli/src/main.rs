//! faultlog CLI - Command-line host for the faultlog diagnostics subsystem
//!
//! Provides commands for:
//! - Locating and viewing the audit log
//! - Redacting API tokens from text
//! - Viewing and validating configuration
//!
//! Errors recorded while a command runs are persisted once, after the
//! command's own result is known. A persistence failure is reported as a
//! separate warning and never changes the exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use faultlog_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod diagnostics;
mod output;

use commands::{config::ConfigCommand, log::LogCommand, redact::RedactCommand, CommandContext};
use diagnostics::Diagnostics;
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "faultlog", version, about = "Error diagnostics for command-line tools")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not record, persist or forward diagnostics for this run
    #[arg(
        long,
        global = true,
        env = "FAULTLOG_NO_DIAGNOSTICS",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_diagnostics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect the audit log
    #[command(subcommand)]
    Log(LogCommand),
    /// Redact API tokens from text
    Redact(RedactCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Commands {
    async fn execute(&self, ctx: &CommandContext) -> anyhow::Result<()> {
        match self {
            Commands::Log(cmd) => cmd.execute(ctx).await,
            Commands::Redact(cmd) => cmd.execute(ctx).await,
            Commands::Config(cmd) => cmd.execute(ctx).await,
        }
    }
}

fn init_tracing(verbose: u8, configured_level: &str) {
    let filter = match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    init_tracing(cli.verbose, &config.logging.level);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let formatter = get_formatter(format);

    let diagnostics = match Diagnostics::from_config(&config, cli.no_diagnostics) {
        Ok(diagnostics) => diagnostics,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let ctx = CommandContext {
        log_path: diagnostics.log_path().to_path_buf(),
        errlog: diagnostics.errlog(),
        config,
        config_path,
        format,
    };

    let result = cli.command.execute(&ctx).await;
    if let Err(e) = &result {
        formatter.error(&format!("{e:#}"));
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = diagnostics.conclude(result, &args).await;
    if let Some(e) = outcome.persist_error() {
        formatter.warn(&format!("Failed to persist error log: {e}"));
    }

    outcome.exit_code()
}
