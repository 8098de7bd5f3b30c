//! Domain entities
//!
//! - `LogEntry`: one recorded error with its timestamp, call site and context
//! - `Caller`: the source location that recorded the error
//! - `Context`: caller-supplied key/value annotations

pub mod entry;

pub use entry::{
    Caller, Context, EntryBuilder, LogEntry, ALLOW_INSTRUMENTATION, DEFAULT_PROJECT_MARKER,
};
