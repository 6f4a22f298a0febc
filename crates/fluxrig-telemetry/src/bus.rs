//! Event bus — queued event dispatch with pluggable sinks.
//!
//! The bus uses `std::sync::mpsc` as its queue. Sinks are registered once
//! at initialization and receive events on [`EventBus::flush`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use crate::events::{EventKind, OrchestrationEvent};
use crate::sinks::EventSink;

/// Event bus for orchestration telemetry.
pub struct EventBus {
    sender: mpsc::Sender<OrchestrationEvent>,
    receiver: mpsc::Receiver<OrchestrationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    /// Disabled bus is a no-op.
    enabled: bool,
    sequence: AtomicU64,
}

impl EventBus {
    /// Creates a new event bus with no sinks.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
            enabled: true,
            sequence: AtomicU64::new(0),
        }
    }

    /// Registers a sink to receive events.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Builder form of [`add_sink`](Self::add_sink).
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Enables or disables the bus. Disabled bus drops events silently.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emit an event. If the bus is disabled, this is a no-op.
    pub fn emit(&self, event: OrchestrationEvent) {
        if !self.enabled {
            return;
        }
        // The receiver lives in `self`, so the send cannot fail.
        let _ = self.sender.send(event);
    }

    /// Emit `kind` stamped with the next sequence number.
    pub fn record(&self, kind: EventKind) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.emit(OrchestrationEvent::new(sequence, kind));
    }

    /// Deliver all pending events to registered sinks.
    pub fn flush(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
        }
    }

    /// Flush, then let every sink finalize.
    pub fn shutdown(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    /// Returns the number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
