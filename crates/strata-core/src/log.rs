//! Stage log sinks.
//!
//! Every [`Stage`](crate::Stage) writes its verbose and failure messages
//! through a [`LogSink`]. The default sink prints to standard error; hosts
//! that already run a `tracing` subscriber can route the same lines there
//! with [`TracingSink`], and tests can capture them with [`MemorySink`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;

/// Destination for stage log lines.
pub trait LogSink: Send + Sync {
    /// Writes one log line.
    fn log(&self, level: Level, args: fmt::Arguments<'_>);
}

/// Writes each line to standard error, ignoring the level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn log(&self, _level: Level, args: fmt::Arguments<'_>) {
        eprintln!("{args}");
    }
}

/// Forwards each line to `tracing` under the `strata::stage` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        match level {
            Level::ERROR => tracing::error!(target: "strata::stage", "{args}"),
            Level::WARN => tracing::warn!(target: "strata::stage", "{args}"),
            Level::INFO => tracing::info!(target: "strata::stage", "{args}"),
            Level::DEBUG => tracing::debug!(target: "strata::stage", "{args}"),
            _ => tracing::trace!(target: "strata::stage", "{args}"),
        }
    }
}

/// Keeps every line in memory.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata_core::log::{LogSink, MemorySink};
///
/// let sink = Arc::new(MemorySink::new());
/// sink.log(tracing::Level::ERROR, format_args!("Error in transform {}", "strip"));
///
/// assert_eq!(sink.messages(), vec!["Error in transform strip".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sink ready to hand to a stage builder.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the recorded lines with their levels.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().clone()
    }

    /// Returns the recorded lines.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Returns true if no line has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.entries.lock().push((level, args.to_string()));
    }
}
