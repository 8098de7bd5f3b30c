//! Redact command - Scrub API tokens from text
//!
//! `faultlog redact [TEXT]...` prints its arguments with tokens replaced by
//! `REDACTED`. With no arguments, standard input is read instead.

use std::io::Read;

use anyhow::{Context as _, Result};
use clap::Args;
use faultlog_core::ALLOW_INSTRUMENTATION;
use faultlog_telemetry::redact;
use serde_json::json;

use super::{context, CommandContext};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct RedactCommand {
    /// Text to redact (reads standard input when omitted)
    pub text: Vec<String>,
}

impl RedactCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let input = if self.text.is_empty() {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read standard input")
            {
                ctx.record(&e, Some(context([(ALLOW_INSTRUMENTATION, json!(false))])));
                return Err(e);
            }
            buf
        } else {
            self.text.join(" ")
        };

        let output = redact(&input);
        match ctx.format {
            OutputFormat::Json => get_formatter(ctx.format).print_json(&json!({
                "redacted": output,
                "changed": output != input,
            })),
            OutputFormat::Human => {
                print!("{output}");
                if !output.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(())
    }
}
