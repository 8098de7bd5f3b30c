//! Configuration module for faultlog.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, log path resolution and a
//! builder for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DEFAULT_PROJECT_MARKER;

/// Default size at which the audit log is truncated (5 MiB).
pub const DEFAULT_ROTATION_SIZE: u64 = 5 * 1024 * 1024;

/// Name of the audit log file inside the resolved directory.
pub const LOG_FILE_NAME: &str = "errors.log";

const APP_DIR: &str = "faultlog";
const HOME_APP_DIR: &str = ".faultlog";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for faultlog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

/// On-disk audit log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Explicit log file location. `None` resolves to the per-user default.
    pub path: Option<PathBuf>,
    /// File size (in bytes) at or above which the log is truncated before writing.
    pub rotation_size_bytes: u64,
    /// Path fragment where project-relative caller paths start.
    pub project_marker: String,
}

/// Remote crash-telemetry settings. Disabled unless explicitly enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// HTTP endpoint that receives exception reports.
    pub endpoint: Option<String>,
    /// Directory for offline exception reports, used when no endpoint is set.
    pub reports_dir: Option<PathBuf>,
    /// Grace period (in milliseconds) for in-flight sends at exit.
    pub flush_timeout_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            rotation_size_bytes: DEFAULT_ROTATION_SIZE,
            project_marker: DEFAULT_PROJECT_MARKER.to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            reports_dir: None,
            flush_timeout_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Errors raised while loading configuration or resolving paths.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the per-user config directory nor the home directory is known
    #[error("unable to deduce user config dir or user home dir")]
    NoLogDirectory,

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

// ---------------------------------------------------------------------------
// Loading and paths
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/faultlog/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR)
            .join("config.yaml")
    }

    /// Location of the audit log.
    ///
    /// Uses `log.path` when set, otherwise `<config dir>/faultlog/errors.log`,
    /// otherwise `<home>/.faultlog/errors.log`.
    pub fn resolve_log_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.log.path {
            return Ok(path.clone());
        }
        default_log_path(dirs::config_dir(), dirs::home_dir())
    }
}

fn default_log_path(
    config_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = config_dir {
        return Ok(dir.join(APP_DIR).join(LOG_FILE_NAME));
    }
    if let Some(dir) = home_dir {
        return Ok(dir.join(HOME_APP_DIR).join(LOG_FILE_NAME));
    }
    Err(ConfigError::NoLogDirectory)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"log.rotation_size_bytes"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- log ---
        if self.log.rotation_size_bytes == 0 {
            errors.push(ValidationError {
                field: "log.rotation_size_bytes".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- telemetry ---
        if let Some(endpoint) = &self.telemetry.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                errors.push(ValidationError {
                    field: "telemetry.endpoint".into(),
                    message: format!("must be an http(s) URL, got '{endpoint}'"),
                });
            }
        }
        if self.telemetry.enabled
            && self.telemetry.endpoint.is_none()
            && self.telemetry.reports_dir.is_none()
        {
            errors.push(ValidationError {
                field: "telemetry.enabled".into(),
                message: "requires telemetry.endpoint or telemetry.reports_dir".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// # Example
///
/// ```rust
/// use faultlog_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .log_path("/tmp/errors.log")
///     .rotation_size_bytes(1024)
///     .build();
/// assert_eq!(config.log.rotation_size_bytes, 1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log.path = Some(path.into());
        self
    }

    pub fn rotation_size_bytes(mut self, size: u64) -> Self {
        self.config.log.rotation_size_bytes = size;
        self
    }

    pub fn project_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.log.project_marker = marker.into();
        self
    }

    pub fn telemetry_enabled(mut self, enabled: bool) -> Self {
        self.config.telemetry.enabled = enabled;
        self
    }

    pub fn telemetry_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.telemetry.endpoint = Some(endpoint.into());
        self
    }

    pub fn telemetry_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.telemetry.reports_dir = Some(dir.into());
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
