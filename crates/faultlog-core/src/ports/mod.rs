//! Port definitions
//!
//! - [`ITelemetrySink`] - Remote crash-telemetry backend (breadcrumbs and captured exceptions)

pub mod telemetry;

pub use telemetry::{Breadcrumb, BreadcrumbKind, ITelemetrySink};
