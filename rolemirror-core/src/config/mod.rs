//! Configuration management for rolemirror
//!
//! Settings come from a TOML file or from `ROLEMIRROR_*` environment
//! variables, are validated once at startup, and are not re-checked per call.
//! A missing space id is fatal at startup, never a per-call error.

use crate::logging::{LogConfig, LogLevel};
use crate::model::{SpaceId, DEFAULT_TRACKED_MARKER};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

mod error;
mod triggers;

pub use error::ConfigError;
pub use triggers::SyncTriggers;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which spaces to mirror and what to mirror
    pub sync: SyncConfig,

    /// Directory access
    pub directory: DirectoryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,

    /// Event triggers
    pub triggers: SyncTriggers,
}

/// Space pair and tracked marker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Space A, the source of truth
    pub source_space_id: SpaceId,

    /// Space B, corrected to follow the source
    pub mirror_space_id: SpaceId,

    /// Marker name, matched case-insensitively
    pub tracked_marker: String,

    /// Upper bound for one event-driven reconciliation
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub call_timeout: Option<Duration>,
}

/// How the directory is reached
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Credential for a networked directory client.
    ///
    /// Only carried through configuration for that client; the in-memory
    /// directory ignores it. Never logged or printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Snapshot file for the in-memory directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record sync counters
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_space_id: SpaceId::new(""),
            mirror_space_id: SpaceId::new(""),
            tracked_marker: DEFAULT_TRACKED_MARKER.to_string(),
            call_timeout: None,
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("token", &self.redacted_token())
            .field("snapshot_path", &self.snapshot_path)
            .finish()
    }
}

impl DirectoryConfig {
    /// Token safe for display
    pub fn redacted_token(&self) -> &'static str {
        if self.token.is_some() {
            "<redacted>"
        } else {
            "<unset>"
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Convert to the logging subsystem's configuration
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level: LogLevel = self
            .level
            .parse()
            .map_err(|_| ConfigError::ValidationFailed(format!("Invalid log level: {}", self.level)))?;

        Ok(LogConfig::new(level)
            .json_format(self.json_format)
            .with_timestamp(self.with_timestamp)
            .with_target(self.with_target))
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", name, e)))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `ROLEMIRROR_<KEY>`, for example
    /// `ROLEMIRROR_SOURCE_SPACE_ID=1234567890`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Sync config
        if let Some(id) = lookup("ROLEMIRROR_SOURCE_SPACE_ID") {
            config.sync.source_space_id = SpaceId::new(id.trim());
        }
        if let Some(id) = lookup("ROLEMIRROR_MIRROR_SPACE_ID") {
            config.sync.mirror_space_id = SpaceId::new(id.trim());
        }
        if let Some(marker) = lookup("ROLEMIRROR_TRACKED_MARKER") {
            config.sync.tracked_marker = marker;
        }
        if let Some(timeout) = lookup("ROLEMIRROR_CALL_TIMEOUT") {
            let timeout = humantime::parse_duration(timeout.trim())
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid call timeout: {}", e)))?;
            config.sync.call_timeout = Some(timeout);
        }

        // Directory config
        if let Some(token) = lookup("ROLEMIRROR_TOKEN") {
            config.directory.token = Some(token);
        }
        if let Some(path) = lookup("ROLEMIRROR_SNAPSHOT_PATH") {
            config.directory.snapshot_path = Some(PathBuf::from(path));
        }

        // Logging config
        if let Some(level) = lookup("ROLEMIRROR_LOG_LEVEL") {
            config.logging.level = level.trim().to_lowercase();
        }
        if let Some(json) = lookup("ROLEMIRROR_LOG_JSON") {
            config.logging.json_format = parse_flag("JSON flag", &json)?;
        }

        // Metrics config
        if let Some(enabled) = lookup("ROLEMIRROR_METRICS_ENABLED") {
            config.metrics.enabled = parse_flag("metrics flag", &enabled)?;
        }

        // Triggers
        if let Some(sweep) = lookup("ROLEMIRROR_SWEEP_ON_STARTUP") {
            config.triggers.sweep_on_startup = parse_flag("sweep flag", &sweep)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.source_space_id.is_blank() {
            return Err(ConfigError::Missing("source_space_id"));
        }

        if self.sync.mirror_space_id.is_blank() {
            return Err(ConfigError::Missing("mirror_space_id"));
        }

        if self.sync.source_space_id == self.sync.mirror_space_id {
            return Err(ConfigError::ValidationFailed(
                "source and mirror space must differ".to_string(),
            ));
        }

        if self.sync.tracked_marker.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "tracked_marker must not be empty".to_string(),
            ));
        }

        if self.sync.call_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ValidationFailed(
                "call_timeout must be greater than 0".to_string(),
            ));
        }

        self.logging.to_log_config()?;

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}
