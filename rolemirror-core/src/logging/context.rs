//! Explicit logging handle injected into components

use super::capture::LogCapture;
use super::{build_dispatch, LogConfig, LogLevel};
use tracing::Dispatch;
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

/// Where a component's log events go.
///
/// The global context forwards to whatever subscriber the process installed.
/// A private context owns its own `Dispatch`; events emitted through
/// [`LogContext::in_scope`] reach only that dispatch.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    dispatch: Option<Dispatch>,
}

impl LogContext {
    /// Forward to the process-wide subscriber
    pub fn global() -> Self {
        Self { dispatch: None }
    }

    /// Drop every event
    pub fn silent() -> Self {
        Self { dispatch: Some(Dispatch::none()) }
    }

    /// Private subscriber writing to `writer`, filtered by `config.level` only
    pub fn with_writer<W>(config: &LogConfig, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::new(config.level.as_str());
        Self { dispatch: Some(build_dispatch(config, filter, writer, false)) }
    }

    /// Private subscriber at `level` plus the buffer it writes to
    pub fn capture(level: LogLevel) -> (Self, LogCapture) {
        let capture = LogCapture::new();
        let config = LogConfig::new(level).with_timestamp(false);
        (Self::with_writer(&config, capture.clone()), capture)
    }

    /// True when events go to the process-wide subscriber
    pub fn is_global(&self) -> bool {
        self.dispatch.is_none()
    }

    /// Run `f` with this context's dispatch as the current default.
    ///
    /// `f` must not await; wrap individual log statements, not futures.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}
