//! Persister - renders recorded entries into the on-disk audit log
//!
//! Each `persist` call appends one block to the log:
//!
//! ```text
//! COMMAND:
//! faultlog service describe
//!
//! TIMESTAMP:
//! 2024-01-02T03:04:05+00:00
//!
//! ERROR:
//! service lookup failed
//!
//! FILE:
//! crates/cli/src/commands/describe.rs
//! LINE:
//! 42
//!
//! Service ID: abc
//!
//! ------------------------------
//!
//! ```
//!
//! When the file is already at or above the rotation size it is truncated
//! before writing, so the log never grows without bound.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use faultlog_core::config::DEFAULT_ROTATION_SIZE;
use faultlog_core::{LogEntry, PersistError};
use faultlog_telemetry::TelemetryForwarder;
use serde_json::Value;
use tracing::{debug, info};

/// Line written after the last entry of each block.
pub const SEPARATOR: &str = "------------------------------\n\n";

/// Program name prefixed to the argument vector in the command header.
pub const DEFAULT_PROGRAM: &str = "faultlog";

/// Writes entries to the audit log and forwards telemetry once per call.
#[derive(Debug, Clone)]
pub struct Persister {
    forwarder: TelemetryForwarder,
    rotation_size: u64,
    program: String,
}

impl Persister {
    pub fn new(forwarder: TelemetryForwarder) -> Self {
        Self {
            forwarder,
            rotation_size: DEFAULT_ROTATION_SIZE,
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Sets the size (in bytes) at which an existing log is truncated.
    pub fn with_rotation_size(mut self, bytes: u64) -> Self {
        self.rotation_size = bytes;
        self
    }

    /// Sets the program name used to rebuild the command line.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Rebuilds the invoked command line from the argument vector
    /// (program name excluded).
    pub fn command_line(&self, args: &[String]) -> String {
        if args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, args.join(" "))
    }

    /// Forward telemetry for `entries`, then append them to `log_path`.
    ///
    /// Does nothing, and touches no file, when `entries` is empty. A failure
    /// part-way through leaves whatever was already written in place.
    pub fn persist(
        &self,
        entries: &[LogEntry],
        log_path: &Path,
        args: &[String],
    ) -> Result<(), PersistError> {
        if entries.is_empty() {
            debug!("No errors recorded, skipping audit log");
            return Ok(());
        }

        let command_line = self.command_line(args);
        self.forwarder.instrument(entries, &command_line);

        let write_err = |source: io::Error| PersistError::Write {
            path: log_path.to_path_buf(),
            source,
        };

        let mut out = BufWriter::new(self.open(log_path)?);
        out.write_all(render_header(&command_line).as_bytes())
            .map_err(write_err)?;
        for entry in entries {
            out.write_all(render_entry(entry).as_bytes())
                .map_err(write_err)?;
        }
        out.write_all(SEPARATOR.as_bytes()).map_err(write_err)?;
        out.flush().map_err(write_err)?;

        info!(
            path = %log_path.display(),
            entries = entries.len(),
            "Persisted audit log"
        );
        Ok(())
    }

    /// Opens the log for appending, truncating it first when it has reached
    /// the rotation size.
    fn open(&self, path: &Path) -> Result<File, PersistError> {
        let file = log_file_options()
            .append(true)
            .open(path)
            .map_err(|source| PersistError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        // An unreadable size skips rotation rather than failing the write.
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        if size < self.rotation_size {
            return Ok(file);
        }

        drop(file);
        debug!(
            path = %path.display(),
            size,
            threshold = self.rotation_size,
            "Rotating audit log"
        );
        log_file_options()
            .truncate(true)
            .open(path)
            .map_err(|source| PersistError::Rotate {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Write-only, create-if-missing, owner read/write only.
fn log_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// Renders the block header for one persist call.
pub fn render_header(command_line: &str) -> String {
    format!("COMMAND:\n{command_line}\n\n")
}

/// Renders one entry: timestamp, error, caller (when known), then context
/// pairs in key order.
pub fn render_entry(entry: &LogEntry) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "TIMESTAMP:\n{}\n\nERROR:\n{:#}\n\n",
        entry.time().to_rfc3339(),
        entry.err()
    );

    if let Some(caller) = entry.caller() {
        let _ = write!(out, "FILE:\n{}\nLINE:\n{}\n\n", caller.file(), caller.line());
    }

    if let Some(context) = entry.context().filter(|c| !c.is_empty()) {
        for (key, value) in context {
            let _ = writeln!(out, "{key}: {}", render_value(value));
        }
        out.push('\n');
    }

    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
