//! Optional leveled logger consumed by the discovery orchestrator.

use std::fmt;

/// Receives leveled diagnostics from discovery.
///
/// Passing no logger suppresses diagnostics but never changes what a scan
/// does or returns.
///
/// # Examples
///
/// ```
/// use blob_plugin::{Logger, TracingLogger};
///
/// let logger = TracingLogger;
/// logger.warning(format_args!("skipping {}", "alpha"));
/// ```
pub trait Logger {
    /// Logs a diagnostic detail.
    fn debug(&self, args: fmt::Arguments<'_>);

    /// Logs a recoverable problem.
    fn warning(&self, args: fmt::Arguments<'_>);

    /// Logs a failure that prevented work from being done.
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Forwards every message to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!("{}", args);
    }

    fn warning(&self, args: fmt::Arguments<'_>) {
        tracing::warn!("{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!("{}", args);
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn debug(&self, args: fmt::Arguments<'_>) {
        (**self).debug(args);
    }

    fn warning(&self, args: fmt::Arguments<'_>) {
        (**self).warning(args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        (**self).error(args);
    }
}
