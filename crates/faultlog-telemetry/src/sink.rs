//! In-process telemetry sinks
//!
//! - [`NoopSink`]: telemetry disabled
//! - [`RecordingSink`]: keeps everything in memory for inspection
//! - [`LocalReportSink`]: writes the captured exception as a JSON report
//!   to a local directory instead of sending it anywhere

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use faultlog_core::{Breadcrumb, ITelemetrySink};
use tracing::{debug, warn};

use crate::report::ExceptionReport;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ITelemetrySink for NoopSink {
    fn add_breadcrumb(&self, _breadcrumb: Breadcrumb) {}

    fn capture_exception(&self, _err: &anyhow::Error) {}
}

/// Sink that records breadcrumbs and captured exception messages.
#[derive(Debug, Default)]
pub struct RecordingSink {
    breadcrumbs: Mutex<Vec<Breadcrumb>>,
    exceptions: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Breadcrumbs received so far, in order.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        lock(&self.breadcrumbs).clone()
    }

    /// `Display` text of each captured exception, in order.
    pub fn exceptions(&self) -> Vec<String> {
        lock(&self.exceptions).clone()
    }
}

impl ITelemetrySink for RecordingSink {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        lock(&self.breadcrumbs).push(breadcrumb);
    }

    fn capture_exception(&self, err: &anyhow::Error) {
        lock(&self.exceptions).push(err.to_string());
    }
}

/// Sink that saves each captured exception under `reports_dir`.
#[derive(Debug)]
pub struct LocalReportSink {
    reports_dir: PathBuf,
    breadcrumbs: Mutex<Vec<Breadcrumb>>,
}

impl LocalReportSink {
    pub fn new(reports_dir: PathBuf) -> Self {
        Self {
            reports_dir,
            breadcrumbs: Mutex::new(Vec::new()),
        }
    }
}

impl ITelemetrySink for LocalReportSink {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        lock(&self.breadcrumbs).push(breadcrumb);
    }

    fn capture_exception(&self, err: &anyhow::Error) {
        let breadcrumbs = std::mem::take(&mut *lock(&self.breadcrumbs));
        let report = ExceptionReport::new(err).with_breadcrumbs(breadcrumbs);
        match report.save(&self.reports_dir) {
            Ok(path) => debug!(path = %path.display(), "Saved exception report"),
            Err(e) => warn!(error = %e, "Failed to save exception report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.add_breadcrumb(Breadcrumb::input("a"));
        sink.add_breadcrumb(Breadcrumb::input("b"));
        sink.capture_exception(&anyhow::anyhow!("boom"));

        let messages: Vec<_> = sink.breadcrumbs().into_iter().map(|b| b.message).collect();
        assert_eq!(messages, vec!["a", "b"]);
        assert_eq!(sink.exceptions(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_local_report_sink_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalReportSink::new(dir.path().join("reports"));
        sink.add_breadcrumb(Breadcrumb::input("faultlog redact"));
        sink.capture_exception(&anyhow::anyhow!("bad input Token abc"));

        let files: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);

        let report: ExceptionReport =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(report.message, "bad input Token REDACTED");
        assert_eq!(report.breadcrumbs.len(), 1);
    }

    #[test]
    fn test_local_report_sink_swallows_write_failure() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot be used as the reports directory
        let sink = LocalReportSink::new(file.path().to_path_buf());
        sink.capture_exception(&anyhow::anyhow!("boom"));
    }
}
