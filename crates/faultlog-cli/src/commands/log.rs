//! Log command - Inspect the audit log
//!
//! Provides the `faultlog log` CLI command which:
//! 1. Prints the resolved audit log location
//! 2. Shows the audit log, with API tokens redacted unless `--raw` is given

use anyhow::{Context as _, Result};
use clap::Subcommand;
use faultlog_telemetry::redact;
use serde_json::json;
use tracing::info;

use super::{context, CommandContext};
use crate::output::{get_formatter, OutputFormat};

/// Log subcommands
#[derive(Debug, Subcommand)]
pub enum LogCommand {
    /// Print the audit log location
    Path,
    /// Display the audit log
    Show {
        /// Show the file as written, without redaction
        #[arg(long)]
        raw: bool,
    },
}

impl LogCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            LogCommand::Path => self.execute_path(ctx),
            LogCommand::Show { raw } => self.execute_show(ctx, *raw),
        }
    }

    fn execute_path(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        match ctx.format {
            OutputFormat::Json => formatter.print_json(&json!({
                "path": ctx.log_path.display().to_string(),
                "exists": ctx.log_path.exists(),
            })),
            OutputFormat::Human => println!("{}", ctx.log_path.display()),
        }
        Ok(())
    }

    fn execute_show(&self, ctx: &CommandContext, raw: bool) -> Result<()> {
        let formatter = get_formatter(ctx.format);

        if !ctx.log_path.exists() {
            formatter.info("No errors recorded yet.");
            return Ok(());
        }

        info!(path = %ctx.log_path.display(), raw, "Showing audit log");

        let content = match std::fs::read_to_string(&ctx.log_path)
            .with_context(|| format!("Failed to read audit log {}", ctx.log_path.display()))
        {
            Ok(content) => content,
            Err(e) => {
                ctx.record(
                    &e,
                    Some(context([("Log Path", json!(ctx.log_path.display().to_string()))])),
                );
                return Err(e);
            }
        };

        let content = if raw { content } else { redact(&content) };

        match ctx.format {
            OutputFormat::Json => formatter.print_json(&json!({
                "path": ctx.log_path.display().to_string(),
                "content": content,
            })),
            OutputFormat::Human => print!("{content}"),
        }
        Ok(())
    }
}
