//! Error types for fluxrig.
//!
//! All crates return `FluxrigResult<T>` from fallible operations.
//! The variants form a closed set that the orchestrator dispatches on:
//! some are healed by rebuilding the solver session, the rest surface
//! to the caller untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of labeled geometric entity in a solver model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    Block,
    Edge,
    Vertex,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelKind::Block => "block",
            LabelKind::Edge => "edge",
            LabelKind::Vertex => "vertex",
        };
        f.write_str(name)
    }
}

/// Unified error type for fluxrig.
#[derive(Debug, Error)]
pub enum FluxrigError {
    /// The engine process is unreachable or the session was lost.
    #[error("Solver connection lost: {0}")]
    ConnectionLost(String),

    /// The engine rejected an automation call.
    #[error("Solver automation error: {0}")]
    Automation(String),

    /// A labeled region does not exist in the loaded model.
    #[error("No {kind} label named '{name}'")]
    LabelNotFound { kind: LabelKind, name: String },

    /// The solve/analyze pair did not return in time.
    #[error("Solve did not finish within {seconds:.1}s")]
    SolveTimeout { seconds: f64 },

    /// The caller asked for something that cannot succeed in the current state.
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Recovery gave up on an operation.
    #[error("{operation} failed after {attempts} attempts; last error: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<FluxrigError>,
    },
}

impl FluxrigError {
    /// Returns true when discarding the session and restarting the
    /// operation on a fresh one can fix the failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FluxrigError::ConnectionLost(_)
                | FluxrigError::Automation(_)
                | FluxrigError::LabelNotFound { .. }
                | FluxrigError::SolveTimeout { .. }
        )
    }

    /// Shorthand for a missing block label.
    pub fn missing_block(name: impl Into<String>) -> Self {
        FluxrigError::LabelNotFound {
            kind: LabelKind::Block,
            name: name.into(),
        }
    }

    /// True for a lookup miss on the given label kind.
    pub fn is_label_miss(&self, expected: LabelKind) -> bool {
        matches!(self, FluxrigError::LabelNotFound { kind, .. } if *kind == expected)
    }
}

/// Convenience alias for `Result<T, FluxrigError>`.
pub type FluxrigResult<T> = Result<T, FluxrigError>;
