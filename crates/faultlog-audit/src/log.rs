//! Error log store
//!
//! Command code records errors through [`IErrorLog`] while it runs; the host
//! calls [`IErrorLog::persist`] once at exit. The host picks [`ErrorLog`] or
//! [`NoopErrorLog`] when it is composed and hands the chosen log down as an
//! `Arc<dyn IErrorLog>`.
//!
//! ## Concurrency
//!
//! The entry sequence sits behind a single mutex held only for the push or
//! the snapshot copy, never across I/O. Persist is expected to run after all
//! recording has finished; concurrent persist calls are not supported.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use faultlog_core::{Caller, Clock, Context, EntryBuilder, LogEntry, PersistError, SystemClock};
use tracing::trace;

use crate::persister::Persister;

/// Recording and shutdown contract for the per-invocation error log
pub trait IErrorLog: Send + Sync {
    /// Records `err` with an optional context and a pre-resolved call site.
    fn add_at(&self, err: anyhow::Error, context: Option<Context>, caller: Option<Caller>);

    /// Records `err` with no context. The call site is captured automatically.
    #[track_caller]
    fn add(&self, err: anyhow::Error) {
        self.add_at(err, None, Some(Caller::here()));
    }

    /// Records `err` with caller-supplied context. The context is owned by
    /// the entry from here on.
    #[track_caller]
    fn add_with_context(&self, err: anyhow::Error, context: Context) {
        self.add_at(err, Some(context), Some(Caller::here()));
    }

    /// Writes every recorded entry to `log_path`. `args` is the argument
    /// vector without the program name.
    fn persist(&self, log_path: &Path, args: &[String]) -> Result<(), PersistError>;

    /// Number of recorded entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only, thread-safe store of recorded entries.
pub struct ErrorLog {
    entries: Mutex<Vec<LogEntry>>,
    builder: EntryBuilder,
    persister: Persister,
}

impl ErrorLog {
    /// Creates an empty log stamped by the system clock.
    pub fn new(persister: Persister) -> Self {
        Self::with_builder(persister, EntryBuilder::new(Arc::new(SystemClock)))
    }

    /// Creates an empty log stamped by `clock`.
    pub fn with_clock(persister: Persister, clock: Arc<dyn Clock>) -> Self {
        Self::with_builder(persister, EntryBuilder::new(clock))
    }

    /// Creates an empty log using a preconfigured entry builder.
    pub fn with_builder(persister: Persister, builder: EntryBuilder) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            builder,
            persister,
        }
    }

    /// Runs `f` over the recorded entries, in recording order.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[LogEntry]) -> R) -> R {
        let entries = self.lock();
        f(entries.as_slice())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // A recorder that panicked mid-push cannot leave the Vec half-written.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IErrorLog for ErrorLog {
    fn add_at(&self, err: anyhow::Error, context: Option<Context>, caller: Option<Caller>) {
        let entry = self.builder.build(err, context, caller);
        let mut entries = self.lock();
        entries.push(entry);
        trace!(entries = entries.len(), "Recorded error");
    }

    fn persist(&self, log_path: &Path, args: &[String]) -> Result<(), PersistError> {
        let snapshot = self.lock().clone();
        self.persister.persist(&snapshot, log_path, args)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

impl std::fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog")
            .field("entries", &self.len())
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

/// Error log with diagnostics suppressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopErrorLog;

impl IErrorLog for NoopErrorLog {
    fn add_at(&self, _err: anyhow::Error, _context: Option<Context>, _caller: Option<Caller>) {}

    fn persist(&self, _log_path: &Path, _args: &[String]) -> Result<(), PersistError> {
        Ok(())
    }

    fn len(&self) -> usize {
        0
    }
}
