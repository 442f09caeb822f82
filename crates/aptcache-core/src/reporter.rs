//! Reporter trait for dependency injection
//!
//! Every component that has something to tell the user takes a
//! `&dyn Reporter` instead of writing to a process-wide logger. Callers pick
//! the sink: `TracingReporter` in the CLI, `MemoryReporter` when a test wants
//! to assert on what was reported, `NullReporter` when nobody cares.

use std::sync::Mutex;

/// Diagnostics sink for core operations.
pub trait Reporter: Send + Sync {
    /// A new phase has started (e.g. "Resolving packages").
    fn section(&self, title: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log detail that is only useful when diagnosing a failure.
    fn debug(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn debug(&self, msg: &str) {
        (**self).debug(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn debug(&self, _: &str) {}
}

/// Forwards every report to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn section(&self, title: &str) {
        tracing::info!("{title}");
    }
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn success(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }
}

/// Severity of a recorded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Recorded via [`Reporter::section`].
    Section,
    /// Recorded via [`Reporter::info`].
    Info,
    /// Recorded via [`Reporter::success`].
    Success,
    /// Recorded via [`Reporter::warning`].
    Warning,
    /// Recorded via [`Reporter::debug`].
    Debug,
}

/// Records every report in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Messages reported at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg)
            .collect()
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, msg.to_string()));
        }
    }
}

impl Reporter for MemoryReporter {
    fn section(&self, title: &str) {
        self.push(Level::Section, title);
    }
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }
    fn success(&self, msg: &str) {
        self.push(Level::Success, msg);
    }
    fn warning(&self, msg: &str) {
        self.push(Level::Warning, msg);
    }
    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn memory_reporter_keeps_order_and_level() {
        let reporter = MemoryReporter::new();
        reporter.section("Resolving");
        reporter.warning("careful");
        reporter.info("done");

        assert_eq!(
            reporter.records(),
            vec![
                (Level::Section, "Resolving".to_string()),
                (Level::Warning, "careful".to_string()),
                (Level::Info, "done".to_string()),
            ]
        );
        assert_eq!(reporter.messages(Level::Warning), vec!["careful"]);
    }

    #[test]
    fn arc_forwards_to_inner() {
        let inner = Arc::new(MemoryReporter::new());
        let shared: Arc<MemoryReporter> = Arc::clone(&inner);
        shared.success("ok");
        assert_eq!(inner.messages(Level::Success), vec!["ok"]);
    }
}
