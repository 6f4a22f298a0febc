//! Orchestration event types.
//!
//! Events are lightweight value types emitted by the orchestrator at
//! every public call, session (re)opening and failure. Each one renders
//! to a single human-readable log line.

use serde::{Deserialize, Serialize};

use fluxrig_types::constants::FAILURE_TAG;

/// An event emitted by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationEvent {
    /// Emission order, starting at 0 for each bus.
    pub sequence: u64,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// Visual break between runs in the session log.
    Separator,

    /// A public operation was invoked.
    CallBegin {
        operation: String,
        /// Rendered arguments, e.g. `phase=2, current=5`.
        detail: String,
    },

    /// A session was opened on a problem.
    SessionOpened {
        problem: String,
        /// The mesh was rebuilt because this replaces a failed session.
        rebuilt: bool,
    },

    /// An attempt of an operation failed.
    Failure {
        operation: String,
        /// 1-based attempt number that failed.
        attempt: u32,
        message: String,
        /// Whether the orchestrator will reset the session and retry.
        recoverable: bool,
    },

    /// Recovery gave up.
    RetriesExhausted { operation: String, attempts: u32 },

    /// A scalar result was extracted.
    Measurement { quantity: String, value: f64 },
}

impl EventKind {
    /// One log line, without timestamp.
    pub fn log_line(&self) -> String {
        match self {
            EventKind::Separator => "-".repeat(58),
            EventKind::CallBegin { operation, detail } if detail.is_empty() => {
                format!("{operation}()")
            }
            EventKind::CallBegin { operation, detail } => format!("{operation}: {detail}"),
            EventKind::SessionOpened { problem, rebuilt } => {
                if *rebuilt {
                    format!("Session reopened: {problem} (mesh rebuilt)")
                } else {
                    format!("Loading model: {problem}")
                }
            }
            EventKind::Failure {
                operation, message, ..
            } => format!("{FAILURE_TAG}: {operation}: {message}"),
            EventKind::RetriesExhausted {
                operation,
                attempts,
            } => format!("{FAILURE_TAG}: {operation} abandoned after {attempts} attempts"),
            EventKind::Measurement { quantity, value } => format!("{quantity} = {value:.6e}"),
        }
    }

    /// True for events that report a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::Failure { .. } | EventKind::RetriesExhausted { .. }
        )
    }
}

impl OrchestrationEvent {
    /// Creates a new event with the given sequence number.
    pub fn new(sequence: u64, kind: EventKind) -> Self {
        Self { sequence, kind }
    }
}
