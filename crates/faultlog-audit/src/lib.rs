//! Faultlog Audit - Per-invocation error log and on-disk audit trail
//!
//! Provides:
//! - `IErrorLog`: recording and shutdown contract handed to command code
//! - `ErrorLog`: thread-safe, append-only store of recorded entries
//! - `NoopErrorLog`: same contract with diagnostics suppressed
//! - `Persister`: renders entries to the rotating audit log and drives telemetry

pub mod log;
pub mod persister;

pub use log::{ErrorLog, IErrorLog, NoopErrorLog};
pub use persister::Persister;
