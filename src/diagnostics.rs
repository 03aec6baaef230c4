//! Side channel for errors that are observed but never surfaced to callers

use tracing::error;

/// Receives errors the request path deliberately swallows (e.g. job saves)
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &anyhow::Error);
}

/// Reports through `tracing` at error level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: &str, error: &anyhow::Error) {
        error!("{}: {:#}", context, error);
    }
}
