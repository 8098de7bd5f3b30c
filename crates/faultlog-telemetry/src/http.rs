//! HTTP telemetry sink
//!
//! Buffers breadcrumbs and, when an exception is captured, POSTs an
//! [`ExceptionReport`] as JSON to the configured endpoint. The send is
//! spawned onto the current tokio runtime and never awaited by the caller;
//! the host may call [`HttpSink::flush`] at exit to give in-flight sends a
//! bounded grace period.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use faultlog_core::{Breadcrumb, ITelemetrySink};
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::report::ExceptionReport;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sink that ships exception reports to a remote endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    breadcrumbs: Mutex<Vec<Breadcrumb>>,
    tracker: TaskTracker,
}

impl HttpSink {
    /// Creates a sink posting to `endpoint`, e.g. `"https://telemetry.example.com/events"`.
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("faultlog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            breadcrumbs: Mutex::new(Vec::new()),
            tracker: TaskTracker::new(),
        })
    }

    /// Waits up to `timeout` for spawned sends to finish.
    ///
    /// Returns `false` if sends were still in flight when the timeout hit.
    pub async fn flush(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }

    fn breadcrumbs(&self) -> MutexGuard<'_, Vec<Breadcrumb>> {
        self.breadcrumbs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ITelemetrySink for HttpSink {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.breadcrumbs().push(breadcrumb);
    }

    fn capture_exception(&self, err: &anyhow::Error) {
        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime available, dropping exception report");
            return;
        };

        let breadcrumbs = std::mem::take(&mut *self.breadcrumbs());
        let report = ExceptionReport::new(err).with_breadcrumbs(breadcrumbs);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        self.tracker.spawn_on(
            async move {
                match client.post(&endpoint).json(&report).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        debug!(id = %report.id, "Exception report delivered");
                    }
                    Ok(resp) => {
                        warn!(status = %resp.status(), "Telemetry endpoint rejected exception report");
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to send exception report");
                    }
                }
            },
            &handle,
        );
    }
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
