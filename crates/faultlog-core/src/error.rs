//! Error types for the diagnostics subsystem
//!
//! Recording never fails. Only persistence has an error surface, and each
//! variant keeps the path and the underlying I/O error so the host can
//! report it as a secondary message.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while writing the audit log to disk
#[derive(Debug, Error)]
pub enum PersistError {
    /// The log file could not be opened or created
    #[error("error accessing audit log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The oversized log file could not be recreated
    #[error("error accessing audit log file {} during rotation: {source}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A header, record or separator could not be written
    #[error("error writing audit log file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistError {
    /// Returns the log path the failure relates to
    pub fn path(&self) -> &std::path::Path {
        match self {
            PersistError::Open { path, .. }
            | PersistError::Rotate { path, .. }
            | PersistError::Write { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_has_prefix() {
        let err = PersistError::Open {
            path: PathBuf::from("/tmp/errors.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "error accessing audit log file /tmp/errors.log: denied"
        );
        assert!(err.source().is_some());
        assert_eq!(err.path(), std::path::Path::new("/tmp/errors.log"));
    }

    #[test]
    fn test_write_error_display() {
        let err = PersistError::Write {
            path: PathBuf::from("errors.log"),
            source: std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"),
        };
        assert_eq!(err.to_string(), "error writing audit log file errors.log: disk full");
    }
}
