//! Exception report generation and persistence
//!
//! An [`ExceptionReport`] is what a sink ships for the run's captured
//! exception: the redacted error, its source chain, and the breadcrumb
//! trail gathered before it.

use std::path::{Path, PathBuf};

use chrono::Utc;
use faultlog_core::Breadcrumb;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::redact::redact;

/// A structured report of the captured exception
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionReport {
    pub id: String,
    pub timestamp: String,
    pub version: String,
    pub message: String,
    /// Redacted `Display` text of each error in the source chain, outermost first
    pub chain: Vec<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub os: String,
    pub arch: String,
}

impl ExceptionReport {
    /// Create a new report for `err`. All error text is redacted.
    pub fn new(err: &anyhow::Error) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            message: redact(&err.to_string()),
            chain: err.chain().skip(1).map(|e| redact(&e.to_string())).collect(),
            breadcrumbs: Vec::new(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Attach the breadcrumb trail.
    pub fn with_breadcrumbs(mut self, breadcrumbs: Vec<Breadcrumb>) -> Self {
        self.breadcrumbs = breadcrumbs;
        self
    }

    /// Save the report as JSON inside `reports_dir`.
    ///
    /// Creates the directory if needed. File name: `error-{date}-{uuid8}.json`
    pub fn save(&self, reports_dir: &Path) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(reports_dir)?;

        let date = Utc::now().format("%Y%m%d");
        let short_id: String = self.id.chars().take(8).collect();
        let path = reports_dir.join(format!("error-{date}-{short_id}.json"));

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_report_creation() {
        let err = anyhow::anyhow!("disk quota exceeded");
        let report = ExceptionReport::new(&err);
        assert!(!report.id.is_empty());
        assert_eq!(report.message, "disk quota exceeded");
        assert!(report.chain.is_empty());
        assert_eq!(report.os, std::env::consts::OS);
    }

    #[test]
    fn test_report_redacts_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("rejected Token abc-123"));
        let err = inner.context("request failed for --token=abc").unwrap_err();
        let report = ExceptionReport::new(&err);
        assert_eq!(report.message, "request failed for --token=REDACTED");
        assert_eq!(report.chain, vec!["rejected Token REDACTED".to_string()]);
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = ExceptionReport::new(&anyhow::anyhow!("boom"))
            .with_breadcrumbs(vec![Breadcrumb::input("faultlog log show")]);

        let path = report.save(dir.path()).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("error-"));
        assert!(name.ends_with(".json"));

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: ExceptionReport = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.message, "boom");
        assert_eq!(loaded.breadcrumbs.len(), 1);
    }
}
