//! Diagnostics composition
//!
//! Builds the error log, persister and telemetry sink from configuration
//! once per run, and drives the single persist at exit.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use faultlog_audit::{ErrorLog, IErrorLog, NoopErrorLog, Persister};
use faultlog_core::config::Config;
use faultlog_core::{EntryBuilder, ITelemetrySink, PersistError, SystemClock};
use faultlog_telemetry::{HttpSink, LocalReportSink, NoopSink, TelemetryForwarder};
use tracing::{debug, warn};

/// Program name written in front of the argument vector.
pub const PROGRAM: &str = "faultlog";

/// Per-run diagnostics owned by the host.
pub struct Diagnostics {
    errlog: Arc<dyn IErrorLog>,
    log_path: PathBuf,
    http: Option<Arc<HttpSink>>,
    flush_timeout: Duration,
}

impl Diagnostics {
    /// Compose diagnostics from `config`. With `suppressed` set every
    /// recording call is a no-op.
    ///
    /// Fails when the log location cannot be resolved or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config, suppressed: bool) -> Result<Self> {
        let log_path = config
            .resolve_log_path()
            .context("Failed to resolve audit log location")?;
        let flush_timeout = Duration::from_millis(config.telemetry.flush_timeout_ms);

        if suppressed {
            debug!("Diagnostics suppressed");
            return Ok(Self {
                errlog: Arc::new(NoopErrorLog),
                log_path,
                http: None,
                flush_timeout,
            });
        }

        let (sink, http) = build_sink(config)?;
        let persister = Persister::new(TelemetryForwarder::new(sink))
            .with_program(PROGRAM)
            .with_rotation_size(config.log.rotation_size_bytes);
        let builder = EntryBuilder::new(Arc::new(SystemClock))
            .with_project_marker(config.log.project_marker.clone());

        Ok(Self {
            errlog: Arc::new(ErrorLog::with_builder(persister, builder)),
            log_path,
            http,
            flush_timeout,
        })
    }

    /// The error log handed to commands.
    pub fn errlog(&self) -> Arc<dyn IErrorLog> {
        Arc::clone(&self.errlog)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Persist the run's entries, creating the log directory if needed,
    /// then give in-flight telemetry a bounded grace period.
    pub async fn finish(&self, args: &[String]) -> Result<(), PersistError> {
        if !self.errlog.is_empty() {
            if let Some(parent) = self.log_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    debug!(error = %e, "Failed to create audit log directory");
                }
            }
        }

        let result = self.errlog.persist(&self.log_path, args);

        if let Some(http) = &self.http {
            if !http.flush(self.flush_timeout).await {
                warn!("Telemetry still in flight at exit");
            }
        }

        result
    }

    /// Persist diagnostics after a command has run and pair the outcome
    /// with the command's own result.
    pub async fn conclude(&self, result: Result<()>, args: &[String]) -> RunOutcome {
        let persist_error = self.finish(args).await.err();
        RunOutcome {
            result,
            persist_error,
        }
    }
}

/// A command's result together with the fate of its diagnostics.
///
/// The exit code follows the command alone; a persist failure is only
/// reported alongside it.
#[derive(Debug)]
pub struct RunOutcome {
    result: Result<()>,
    persist_error: Option<PersistError>,
}

impl RunOutcome {
    /// The command's own result.
    pub fn result(&self) -> &Result<()> {
        &self.result
    }

    /// Why the audit log could not be written, if it could not.
    pub fn persist_error(&self) -> Option<&PersistError> {
        self.persist_error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

type SinkParts = (Arc<dyn ITelemetrySink>, Option<Arc<HttpSink>>);

fn build_sink(config: &Config) -> Result<SinkParts> {
    let telemetry = &config.telemetry;
    if !telemetry.enabled {
        return Ok((Arc::new(NoopSink), None));
    }

    if let Some(endpoint) = &telemetry.endpoint {
        let http = Arc::new(HttpSink::new(endpoint).context("Failed to build telemetry client")?);
        let sink: Arc<dyn ITelemetrySink> = http.clone();
        debug!(endpoint = %endpoint, "Telemetry enabled");
        return Ok((sink, Some(http)));
    }

    if let Some(dir) = &telemetry.reports_dir {
        debug!(dir = %dir.display(), "Telemetry enabled with local reports");
        return Ok((Arc::new(LocalReportSink::new(dir.clone())), None));
    }

    warn!("Telemetry enabled without endpoint or reports_dir, disabling");
    Ok((Arc::new(NoopSink), None))
}
