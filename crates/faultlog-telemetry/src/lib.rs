//! Faultlog Telemetry - Secret redaction and opt-in crash reporting
//!
//! Provides:
//! - `redact`: scrubs API tokens from text before it leaves the process
//! - `TelemetryForwarder`: filters recorded entries by their opt-in marker
//!   and forwards breadcrumbs plus the final exception to a sink
//! - `ExceptionReport`: structured report of the captured exception
//! - Sinks: `HttpSink`, `LocalReportSink`, `RecordingSink`, `NoopSink`

pub mod forwarder;
pub mod http;
pub mod redact;
pub mod report;
pub mod sink;

pub use forwarder::TelemetryForwarder;
pub use http::HttpSink;
pub use redact::{contains_secret, redact};
pub use report::ExceptionReport;
pub use sink::{LocalReportSink, NoopSink, RecordingSink};
