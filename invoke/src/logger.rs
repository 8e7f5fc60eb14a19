//! Human-readable progress sinks for the retry loop.

use tracing::info;

/// Receives one progress line per failure, retry and final outcome.
pub trait ProgressLogger: Send + Sync {
    fn log(&self, message: &str);
}

/// Prints every line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLogger;

impl ProgressLogger for StdoutLogger {
    fn log(&self, message: &str) {
        println!("{message}");
    }
}

/// Forwards every line to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ProgressLogger for TracingLogger {
    fn log(&self, message: &str) {
        info!(target: "lore_invoke::progress", "{message}");
    }
}

impl<F> ProgressLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message);
    }
}
