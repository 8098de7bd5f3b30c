//! Integration test: ErrorLog → Persister → audit log file + telemetry sink
//!
//! Exercises the full shutdown flow against a real temporary file and an
//! in-memory telemetry sink.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use faultlog_audit::{ErrorLog, IErrorLog, Persister};
use faultlog_core::{Context, FixedClock, ALLOW_INSTRUMENTATION};
use faultlog_telemetry::{RecordingSink, TelemetryForwarder};
use serde_json::json;

const TIMESTAMP: &str = "2024-03-04T05:06:07+00:00";

fn make_log(sink: Arc<RecordingSink>, rotation_size: u64) -> ErrorLog {
    let at = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
    let persister = Persister::new(TelemetryForwarder::new(sink))
        .with_program("fastly")
        .with_rotation_size(rotation_size);
    ErrorLog::with_clock(persister, Arc::new(FixedClock::new(at)))
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read audit log")
}

#[test]
fn test_end_to_end_describe_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let sink = Arc::new(RecordingSink::new());
    let log = make_log(sink.clone(), 5 * 1024 * 1024);

    let mut ctx = Context::new();
    ctx.insert("Service ID".into(), json!("abc"));
    ctx.insert(ALLOW_INSTRUMENTATION.into(), json!(true));
    log.add_with_context(anyhow::anyhow!("service lookup failed"), ctx);
    log.add(anyhow::anyhow!("not found"));

    log.persist(&path, &args(&["service", "describe"])).unwrap();

    // Telemetry: command breadcrumb plus exactly one eligible entry
    let crumbs = sink.breadcrumbs();
    assert_eq!(crumbs.len(), 2);
    assert_eq!(crumbs[0].category.as_deref(), Some("input"));
    assert_eq!(crumbs[0].message, "fastly service describe");
    assert!(crumbs[1].message.starts_with("service lookup failed (file: "));
    assert_eq!(crumbs[1].category.as_deref(), Some("integration_test"));
    assert_eq!(sink.exceptions(), vec!["not found".to_string()]);

    // Disk: header, E1 then E2, trailing separator
    let content = read(&path);
    assert!(content.starts_with("COMMAND:\nfastly service describe\n\n"));
    assert!(content.ends_with("------------------------------\n\n"));
    assert_eq!(content.matches(&format!("TIMESTAMP:\n{TIMESTAMP}\n")).count(), 2);

    let e1 = content.find("ERROR:\nservice lookup failed\n").expect("E1 rendered");
    let e2 = content.find("ERROR:\nnot found\n").expect("E2 rendered");
    assert!(e1 < e2);

    let context_line = content.find("Service ID: abc\n").expect("E1 context rendered");
    assert!(e1 < context_line && context_line < e2);
    assert_eq!(content.matches("Service ID: abc").count(), 1);
    assert_eq!(content.matches("FILE:\n").count(), 2);
    assert!(content.contains("integration_test.rs\nLINE:\n"));
}

#[test]
fn test_opted_out_entry_is_persisted_but_not_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let sink = Arc::new(RecordingSink::new());
    let log = make_log(sink.clone(), 5 * 1024 * 1024);

    let mut ctx = Context::new();
    ctx.insert(ALLOW_INSTRUMENTATION.into(), json!(false));
    log.add_with_context(anyhow::anyhow!("remote api rejected request"), ctx);
    log.persist(&path, &args(&["whoami"])).unwrap();

    let crumbs = sink.breadcrumbs();
    assert_eq!(crumbs.len(), 1);
    assert!(crumbs
        .iter()
        .all(|c| !c.message.contains("remote api rejected request")));
    assert!(read(&path).contains("ERROR:\nremote api rejected request\n"));
    assert!(read(&path).contains("AllowInstrumentation: false\n"));
}

#[test]
fn test_empty_log_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let sink = Arc::new(RecordingSink::new());
    let log = make_log(sink.clone(), 5 * 1024 * 1024);

    log.persist(&path, &args(&["service", "list"])).unwrap();

    assert!(!path.exists());
    assert!(sink.breadcrumbs().is_empty());
    assert!(sink.exceptions().is_empty());
}

#[test]
fn test_file_at_threshold_is_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let old = "x".repeat(64);
    std::fs::write(&path, &old).unwrap();

    let log = make_log(Arc::new(RecordingSink::new()), 64);
    log.add(anyhow::anyhow!("fresh failure"));
    log.persist(&path, &args(&["log", "show"])).unwrap();

    let content = read(&path);
    assert!(!content.contains(&old));
    assert!(content.starts_with("COMMAND:\nfastly log show\n\n"));
    assert!(content.contains("ERROR:\nfresh failure\n"));
}

#[test]
fn test_file_below_threshold_is_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let old = "previous run\n";
    std::fs::write(&path, old).unwrap();

    let log = make_log(Arc::new(RecordingSink::new()), 1024);
    log.add(anyhow::anyhow!("fresh failure"));
    log.persist(&path, &args(&["log", "show"])).unwrap();

    let content = read(&path);
    assert!(content.starts_with(old));
    assert!(content[old.len()..].starts_with("COMMAND:\n"));
    assert!(content.contains("ERROR:\nfresh failure\n"));
}

#[test]
fn test_repeated_persist_appends_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");

    for run in ["first", "second"] {
        let log = make_log(Arc::new(RecordingSink::new()), 5 * 1024 * 1024);
        log.add(anyhow::anyhow!("{run} failure"));
        log.persist(&path, &args(&[run])).unwrap();
    }

    let content = read(&path);
    assert_eq!(content.matches("COMMAND:\n").count(), 2);
    assert!(content.find("first failure").unwrap() < content.find("second failure").unwrap());
}

#[cfg(unix)]
#[test]
fn test_new_log_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let log = make_log(Arc::new(RecordingSink::new()), 5 * 1024 * 1024);
    log.add(anyhow::anyhow!("x"));
    log.persist(&path, &[]).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_concurrent_recording_loses_nothing() {
    const WORKERS: usize = 8;
    const PER_WORKER: usize = 250;

    let log = Arc::new(make_log(Arc::new(RecordingSink::new()), 5 * 1024 * 1024));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..PER_WORKER {
                    let mut ctx = Context::new();
                    ctx.insert("worker".into(), json!(worker));
                    ctx.insert("seq".into(), json!(i));
                    log.add_with_context(anyhow::anyhow!("worker {worker} error {i}"), ctx);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(log.len(), WORKERS * PER_WORKER);

    // Per-worker order is preserved inside the global sequence
    log.with_entries(|entries| {
        for worker in 0..WORKERS {
            let seqs: Vec<u64> = entries
                .iter()
                .filter_map(|e| e.context())
                .filter(|c| c.get("worker") == Some(&json!(worker)))
                .filter_map(|c| c.get("seq").and_then(|v| v.as_u64()))
                .collect();
            let expected: Vec<u64> = (0..PER_WORKER as u64).collect();
            assert_eq!(seqs, expected);
        }
    });
}
