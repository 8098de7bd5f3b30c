//! Telemetry sink port (driven/secondary port)
//!
//! Defines the interface to a remote crash-telemetry backend. The
//! forwarder speaks in two primitives borrowed from crash reporters:
//! breadcrumbs (timestamped events leading up to a failure) and a single
//! captured exception per run.
//!
//! ## Design Notes
//!
//! - Methods return nothing. Delivery is fire-and-forget and failures
//!   stay inside the adapter.
//! - Implementations must be cheap to call; any network I/O is handed off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Context;

/// Breadcrumb type, mirroring the levels crash reporters group events by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbKind {
    Info,
    Error,
}

impl std::fmt::Display for BreadcrumbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BreadcrumbKind::Info => "info",
            BreadcrumbKind::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A diagnostic event forwarded ahead of the captured exception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Grouping key: `input` for the command line, the recording file's
    /// stem for errors
    pub category: Option<String>,
    pub message: String,
    pub kind: BreadcrumbKind,
    /// Entry context, forwarded as structured data
    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub data: Context,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Breadcrumb {
    /// Category used for the invoked command line
    pub const INPUT_CATEGORY: &'static str = "input";

    /// Creates the breadcrumb that records the invoked command line
    pub fn input(command_line: impl Into<String>) -> Self {
        Self {
            category: Some(Self::INPUT_CATEGORY.to_string()),
            message: command_line.into(),
            kind: BreadcrumbKind::Info,
            data: Context::new(),
            timestamp: None,
        }
    }

    /// Creates an error breadcrumb
    pub fn error(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            category: None,
            message: message.into(),
            kind: BreadcrumbKind::Error,
            data: Context::new(),
            timestamp: Some(timestamp),
        }
    }

    /// Sets the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the structured data
    pub fn with_data(mut self, data: Context) -> Self {
        self.data = data;
        self
    }
}

/// Port trait for a crash-telemetry backend
///
/// ## Implementation Notes
///
/// - `add_breadcrumb` appends to the trail attached to the next captured
///   exception.
/// - `capture_exception` reports the run's final error. It must not block
///   on the network; callers never observe the outcome.
pub trait ITelemetrySink: Send + Sync {
    /// Records a breadcrumb
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb);

    /// Reports an error as the run's captured exception
    fn capture_exception(&self, err: &anyhow::Error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_breadcrumb() {
        let b = Breadcrumb::input("faultlog log show");
        assert_eq!(b.category.as_deref(), Some("input"));
        assert_eq!(b.kind, BreadcrumbKind::Info);
        assert!(b.timestamp.is_none());
    }

    #[test]
    fn test_error_breadcrumb_builders() {
        let mut data = Context::new();
        data.insert("Service ID".into(), json!("abc"));
        let b = Breadcrumb::error("not found", Utc::now())
            .with_category("describe")
            .with_data(data.clone());
        assert_eq!(b.kind, BreadcrumbKind::Error);
        assert_eq!(b.category.as_deref(), Some("describe"));
        assert_eq!(b.data, data);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_value(BreadcrumbKind::Error).unwrap(), json!("error"));
        assert_eq!(BreadcrumbKind::Info.to_string(), "info");
    }
}
