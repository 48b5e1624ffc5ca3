//! Logging subsystem for rolemirror
//!
//! Built on `tracing`. The binary installs one process-wide subscriber with
//! [`init_logging_with_config`]. Library components never depend on that:
//! they are handed a [`LogContext`] at construction and emit through it, so
//! two engines in one process (or one test) can log to different sinks.

use tracing::Dispatch;
use tracing_subscriber::{fmt, fmt::MakeWriter, layer::SubscriberExt, EnvFilter};

mod capture;
mod context;
mod error;
mod level;

pub use capture::LogCapture;
pub use context::LogContext;
pub use error::LoggingError;
pub use level::LogLevel;

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// The minimum log level to display
    pub level: LogLevel,
    /// Whether to include timestamps
    pub with_timestamp: bool,
    /// Whether to include target module information
    pub with_target: bool,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Create a configuration with the given level and default formatting
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Set whether to include timestamps
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    /// Set whether to include target information
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Set whether to use JSON formatting
    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

/// Build a subscriber for `config` writing to `writer`, wrapped in a `Dispatch`
pub(crate) fn build_dispatch<W>(config: &LogConfig, filter: EnvFilter, writer: W, ansi: bool) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(config.with_target)
        .with_ansi(ansi)
        .with_writer(writer);
    let registry = tracing_subscriber::registry().with(filter);

    match (config.json_format, config.with_timestamp) {
        (true, true) => Dispatch::new(registry.with(layer.json())),
        (true, false) => Dispatch::new(registry.with(layer.json().without_time())),
        (false, true) => Dispatch::new(registry.with(layer)),
        (false, false) => Dispatch::new(registry.with(layer.without_time())),
    }
}

/// Initialize the process-wide subscriber with default configuration
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize the process-wide subscriber.
///
/// Output goes to stderr. `RUST_LOG`, when set, takes precedence over
/// `config.level`.
///
/// # Example
/// ```
/// use rolemirror_core::logging::{init_logging_with_config, LogConfig, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug).with_target(false);
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let dispatch = build_dispatch(&config, env_filter, std::io::stderr, true);

    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.with_timestamp);
        assert!(config.with_target);
        assert!(!config.json_format);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new(LogLevel::Debug)
            .with_timestamp(false)
            .with_target(false)
            .json_format(true);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.with_timestamp);
        assert!(!config.with_target);
        assert!(config.json_format);
    }
}
