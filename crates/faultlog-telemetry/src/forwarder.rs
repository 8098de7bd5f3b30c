//! Telemetry forwarding
//!
//! Reports a curated subset of the run's entries to a telemetry sink.
//! Every entry is persisted locally, but only entries whose context sets
//! [`ALLOW_INSTRUMENTATION`](faultlog_core::ALLOW_INSTRUMENTATION) to `true`
//! become breadcrumbs. Text is redacted before it reaches the sink.

use std::sync::Arc;

use faultlog_core::{Breadcrumb, Context, ITelemetrySink, LogEntry};
use serde_json::Value;
use tracing::debug;

use crate::redact::redact;
use crate::sink::NoopSink;

/// Message used when an error renders to an empty string.
const UNKNOWN_ERROR: &str = "unknown";

/// Forwards recorded entries to a telemetry sink.
#[derive(Clone)]
pub struct TelemetryForwarder {
    sink: Arc<dyn ITelemetrySink>,
}

impl TelemetryForwarder {
    pub fn new(sink: Arc<dyn ITelemetrySink>) -> Self {
        Self { sink }
    }

    /// Forwarder backed by [`NoopSink`].
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopSink))
    }

    /// Forward the run's entries.
    ///
    /// Always emits an `input` breadcrumb for `command_line`, then one error
    /// breadcrumb per opted-in entry, then captures the last entry's error
    /// as the run's exception. With no entries nothing is captured.
    pub fn instrument(&self, entries: &[LogEntry], command_line: &str) {
        self.sink.add_breadcrumb(Breadcrumb::input(redact(command_line)));

        let mut forwarded = 0usize;
        for entry in entries.iter().filter(|e| e.allows_instrumentation()) {
            self.sink.add_breadcrumb(error_breadcrumb(entry));
            forwarded += 1;
        }

        if let Some(last) = entries.last() {
            self.sink.capture_exception(last.err());
        }

        debug!(entries = entries.len(), forwarded, "Forwarded telemetry");
    }
}

impl std::fmt::Debug for TelemetryForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryForwarder").finish_non_exhaustive()
    }
}

fn error_breadcrumb(entry: &LogEntry) -> Breadcrumb {
    let (file, line) = entry
        .caller()
        .map(|c| (c.file(), c.line()))
        .unwrap_or(("", 0));

    let mut err = format!("{:#}", entry.err());
    if err.is_empty() {
        err = UNKNOWN_ERROR.to_string();
    }

    let message = redact(&format!("{err} (file: {file}, line: {line})"));
    let data = entry.context().map(redact_context).unwrap_or_default();

    let breadcrumb = Breadcrumb::error(message, entry.time()).with_data(data);
    match entry.caller().and_then(|c| c.file_stem()) {
        Some(stem) => breadcrumb.with_category(stem),
        None => breadcrumb,
    }
}

/// Redacts string values; other values pass through untouched.
fn redact_context(context: &Context) -> Context {
    context
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(redact(s)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}
