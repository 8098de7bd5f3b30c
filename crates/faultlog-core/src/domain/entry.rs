//! Log entry domain entities
//!
//! A [`LogEntry`] is built once, when an error is recorded, and never
//! mutated afterwards. The [`EntryBuilder`] owns the two inputs that are
//! not supplied by the recording caller: the clock and the project marker
//! used to shorten source paths.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::clock::Clock;

/// Context key that opts an entry in to remote telemetry.
///
/// All entries are persisted to disk, but only those whose context carries
/// this key set to boolean `true` are forwarded. Errors that are not
/// actionable (remote API rejections, user input mistakes) leave it unset.
pub const ALLOW_INSTRUMENTATION: &str = "AllowInstrumentation";

/// Path fragment that marks the start of the project-relative part of a
/// source file path.
pub const DEFAULT_PROJECT_MARKER: &str = "crates/";

/// Caller-supplied structured annotations.
///
/// Keys are kept sorted so rendering order is stable across runs.
pub type Context = BTreeMap<String, Value>;

/// Source location of the code that recorded an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    file: String,
    line: u32,
}

impl Caller {
    /// Creates a caller from a pre-resolved file and line.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Captures the location of whoever called this function.
    ///
    /// Propagates through every `#[track_caller]` frame above it, so a
    /// recording method marked `#[track_caller]` resolves to its own caller.
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }

    /// Keeps the path from the first occurrence of `marker` onwards, or the
    /// full path when the marker is absent.
    pub fn relative_to(mut self, marker: &str) -> Self {
        if !marker.is_empty() {
            if let Some(idx) = self.file.find(marker) {
                self.file.replace_range(..idx, "");
            }
        }
        self
    }

    /// Returns the source file path
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Returns the source line
    pub fn line(&self) -> u32 {
        self.line
    }

    /// File name without directories or extension, e.g. `describe` for
    /// `crates/cli/src/commands/describe.rs`.
    pub fn file_stem(&self) -> Option<&str> {
        std::path::Path::new(&self.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single recorded error occurrence
#[derive(Debug, Clone)]
pub struct LogEntry {
    time: DateTime<Utc>,
    err: Arc<anyhow::Error>,
    caller: Option<Caller>,
    context: Option<Context>,
}

impl LogEntry {
    /// When the error was recorded
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// The recorded error
    pub fn err(&self) -> &anyhow::Error {
        &self.err
    }

    /// Where the error was recorded, if it could be resolved
    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    /// Caller-supplied context. `None` means no context was attached.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Returns true only if the context holds [`ALLOW_INSTRUMENTATION`] set to
    /// boolean `true`. A missing context, a missing key, `false` or a
    /// non-boolean value all opt out.
    pub fn allows_instrumentation(&self) -> bool {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.get(ALLOW_INSTRUMENTATION))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Builds [`LogEntry`] values with an injected clock.
#[derive(Clone)]
pub struct EntryBuilder {
    clock: Arc<dyn Clock>,
    project_marker: String,
}

impl EntryBuilder {
    /// Creates a builder using [`DEFAULT_PROJECT_MARKER`].
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            project_marker: DEFAULT_PROJECT_MARKER.to_string(),
        }
    }

    /// Overrides the marker used to shorten caller paths.
    pub fn with_project_marker(mut self, marker: impl Into<String>) -> Self {
        self.project_marker = marker.into();
        self
    }

    /// Builds an entry stamped with the current clock time.
    ///
    /// The context is moved in; once built it is owned by the entry and no
    /// longer reachable by the caller.
    pub fn build(
        &self,
        err: anyhow::Error,
        context: Option<Context>,
        caller: Option<Caller>,
    ) -> LogEntry {
        LogEntry {
            time: self.clock.now(),
            err: Arc::new(err),
            caller: caller.map(|c| c.relative_to(&self.project_marker)),
            context,
        }
    }
}

impl fmt::Debug for EntryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryBuilder")
            .field("project_marker", &self.project_marker)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn builder() -> EntryBuilder {
        let at = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        EntryBuilder::new(Arc::new(FixedClock::new(at)))
    }

    #[test]
    fn test_build_uses_injected_clock() {
        let entry = builder().build(anyhow::anyhow!("boom"), None, None);
        assert_eq!(
            entry.time(),
            Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(entry.err().to_string(), "boom");
        assert!(entry.caller().is_none());
        assert!(entry.context().is_none());
    }

    #[test]
    fn test_caller_truncated_at_marker() {
        let caller = Caller::new("/home/dev/faultlog/crates/cli/src/main.rs", 42);
        let entry = builder().build(anyhow::anyhow!("x"), None, Some(caller));
        let caller = entry.caller().unwrap();
        assert_eq!(caller.file(), "crates/cli/src/main.rs");
        assert_eq!(caller.line(), 42);
    }

    #[test]
    fn test_caller_kept_whole_without_marker() {
        let caller = Caller::new("/opt/build/main.rs", 7).relative_to("crates/");
        assert_eq!(caller.file(), "/opt/build/main.rs");
    }

    #[test]
    fn test_custom_marker() {
        let entry = builder().with_project_marker("/pkg/").build(
            anyhow::anyhow!("x"),
            None,
            Some(Caller::new("/go/src/cli/pkg/app/run.go", 3)),
        );
        assert_eq!(entry.caller().unwrap().file(), "/pkg/app/run.go");
    }

    #[test]
    fn test_caller_here_points_at_this_file() {
        let caller = Caller::here();
        assert!(caller.file().ends_with("entry.rs"));
        assert!(caller.line() > 0);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(
            Caller::new("crates/cli/src/commands/describe.rs", 1).file_stem(),
            Some("describe")
        );
        assert_eq!(Caller::new("", 1).file_stem(), None);
    }

    #[test]
    fn test_allows_instrumentation() {
        let b = builder();
        let mut ctx = Context::new();
        ctx.insert(ALLOW_INSTRUMENTATION.to_string(), json!(true));
        assert!(b.build(anyhow::anyhow!("a"), Some(ctx), None).allows_instrumentation());

        let mut ctx = Context::new();
        ctx.insert(ALLOW_INSTRUMENTATION.to_string(), json!(false));
        assert!(!b.build(anyhow::anyhow!("b"), Some(ctx), None).allows_instrumentation());

        let mut ctx = Context::new();
        ctx.insert(ALLOW_INSTRUMENTATION.to_string(), json!("true"));
        assert!(!b.build(anyhow::anyhow!("c"), Some(ctx), None).allows_instrumentation());

        assert!(!b
            .build(anyhow::anyhow!("d"), Some(Context::new()), None)
            .allows_instrumentation());
        assert!(!b.build(anyhow::anyhow!("e"), None, None).allows_instrumentation());
    }
}
