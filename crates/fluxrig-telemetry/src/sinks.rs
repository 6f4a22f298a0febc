//! Pluggable event sinks.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::events::{EventKind, OrchestrationEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &OrchestrationEvent);

    /// Called on bus shutdown. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Collects events in memory.
///
/// Clones share one buffer, so a test can keep a handle while the bus
/// owns the boxed sink.
#[derive(Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<OrchestrationEvent>>>,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected events.
    pub fn events(&self) -> Vec<OrchestrationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of collected failure events.
    pub fn failure_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Failure { .. }))
            .count()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &OrchestrationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events using the `tracing` crate.
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &OrchestrationEvent) {
        if event.kind.is_failure() {
            tracing::warn!(
                sequence = event.sequence,
                event = ?event.kind,
                "orchestration_failure"
            );
        } else {
            tracing::info!(
                sequence = event.sequence,
                event = ?event.kind,
                "orchestration_event"
            );
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

/// Appends `HH:MM:SS message` lines to a text file.
///
/// Every line is written straight to the file so the log survives a
/// crash of the caller.
pub struct LogFileSink {
    path: PathBuf,
    file: File,
}

impl LogFileSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders one log line with the local wall-clock time.
    pub fn format_line(kind: &EventKind) -> String {
        format!(
            "{} {}",
            chrono::Local::now().format("%H:%M:%S"),
            kind.log_line()
        )
    }
}

impl EventSink for LogFileSink {
    fn handle(&mut self, event: &OrchestrationEvent) {
        let line = Self::format_line(&event.kind);
        if let Err(e) = writeln!(self.file, "{line}") {
            tracing::warn!(error = %e, path = %self.path.display(), "session log write failed");
        }
    }

    fn finalize(&mut self) {
        if let Err(e) = self.file.flush() {
            tracing::warn!(error = %e, path = %self.path.display(), "session log flush failed");
        }
    }

    fn name(&self) -> &str {
        "log_file_sink"
    }
}
