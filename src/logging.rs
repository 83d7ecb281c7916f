//! Log reporting.
//!
//! Components take an `Arc<dyn Reporter>` instead of logging through a global
//! handler. The binary wires in `TracingReporter`; tests use `MemoryReporter`
//! and assert on what was recorded.

use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Sink for the pipeline's human-readable log lines.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards every line to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Records lines in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Messages logged at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::ERROR, message);
    }
}

/// Default reporter used by the binary.
pub fn tracing_reporter() -> Arc<dyn Reporter> {
    Arc::new(TracingReporter)
}

/// Install the fmt subscriber. `RUST_LOG` wins over `verbose` when set.
pub fn init_subscriber(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reporter_keeps_levels_in_order() {
        let reporter = MemoryReporter::new();
        reporter.info("one");
        reporter.error("two");
        reporter.warn("three");

        let lines = reporter.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], (Level::ERROR, "two".to_string()));
        assert_eq!(reporter.messages_at(Level::WARN), vec!["three".to_string()]);
    }
}
