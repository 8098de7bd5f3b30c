//! Config command - View and validate faultlog configuration
//!
//! Provides the `faultlog config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors

use anyhow::{anyhow, Context as _, Result};
use clap::Subcommand;
use faultlog_core::config::Config;
use faultlog_core::ALLOW_INSTRUMENTATION;
use serde_json::json;
use tracing::info;

use super::{context, CommandContext};
use crate::output::{get_formatter, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Validate => self.execute_validate(ctx),
        }
    }

    fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        // Serialising our own config can only fail on a bug, so this is
        // opted in to telemetry.
        let value = serde_json::to_value(&ctx.config)
            .context("Failed to serialize configuration")
            .inspect_err(|e| record_bug(ctx, e))?;

        if ctx.format == OutputFormat::Human {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");
        }
        formatter.print_json(&value);
        Ok(())
    }

    fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);

        let config = match Config::load(&ctx.config_path) {
            Ok(config) => config,
            Err(e) => {
                let err = anyhow::Error::new(e);
                ctx.record(
                    &err,
                    Some(context([(
                        "Config Path",
                        json!(ctx.config_path.display().to_string()),
                    )])),
                );
                return Err(err);
            }
        };

        let errors = config.validate();
        if errors.is_empty() {
            match ctx.format {
                OutputFormat::Json => formatter.print_json(&json!({ "valid": true })),
                OutputFormat::Human => formatter.success("Configuration is valid"),
            }
            return Ok(());
        }

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        if ctx.format == OutputFormat::Json {
            formatter.print_json(&json!({ "valid": false, "errors": messages }));
        }
        let err = anyhow!("invalid configuration: {}", messages.join("; "));
        ctx.record(
            &err,
            Some(context([
                ("Config Path", json!(ctx.config_path.display().to_string())),
                ("Errors", json!(errors.len())),
            ])),
        );
        Err(err)
    }
}

#[track_caller]
fn record_bug(ctx: &CommandContext, err: &anyhow::Error) {
    ctx.record(err, Some(context([(ALLOW_INSTRUMENTATION, json!(true))])));
}
