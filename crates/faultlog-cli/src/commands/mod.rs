//! Command implementations
//!
//! Every command receives a [`CommandContext`] carrying the run's error log.
//! Failures are recorded with context before being returned, so the audit
//! log holds the detail while the terminal shows a short message.

pub mod config;
pub mod log;
pub mod redact;

use std::path::PathBuf;
use std::sync::Arc;

use faultlog_audit::IErrorLog;
use faultlog_core::config::Config;
use faultlog_core::{Caller, Context};

use crate::output::OutputFormat;

/// Shared inputs for command execution
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub log_path: PathBuf,
    pub format: OutputFormat,
    pub errlog: Arc<dyn IErrorLog>,
}

impl CommandContext {
    /// Records `err` in the error log, tagged with the caller's location.
    ///
    /// The recorded copy keeps the full `{:#}` message chain; the original
    /// error stays with the caller to be returned.
    #[track_caller]
    pub fn record(&self, err: &anyhow::Error, context: Option<Context>) {
        self.errlog.add_at(
            anyhow::anyhow!("{err:#}"),
            context,
            Some(Caller::here()),
        );
    }
}

/// Builds a context map from literal pairs.
pub fn context<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> Context {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
