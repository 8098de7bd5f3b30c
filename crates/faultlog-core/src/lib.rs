//! Faultlog Core - Domain types for per-invocation error diagnostics
//!
//! This crate contains the pieces every other faultlog crate shares:
//! - **Domain entities** - `LogEntry`, `Caller`, `Context`
//! - **Clock port** - injectable time source so entries can be stamped deterministically
//! - **Telemetry port** - `ITelemetrySink` and the `Breadcrumb` type forwarded through it
//! - **Configuration** - YAML-backed settings and log path resolution
//! - **Errors** - typed persistence failures
//!
//! # Architecture
//!
//! The domain module has no I/O. Adapter crates (`faultlog-telemetry`,
//! `faultlog-audit`) implement the ports and drive persistence.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{Caller, Context, EntryBuilder, LogEntry, ALLOW_INSTRUMENTATION};
pub use error::PersistError;
pub use ports::{Breadcrumb, BreadcrumbKind, ITelemetrySink};
