//! # fluxrig-types
//!
//! Shared identifiers, label naming, error types, and defaults
//! for the fluxrig field-solver orchestration workspace.
//!
//! This crate has zero orchestration logic — it defines the vocabulary
//! that the session boundary, the orchestrator and the CLI share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod labels;

pub use error::{FluxrigError, FluxrigResult, LabelKind};
pub use ids::{MagnetId, PhaseId};
pub use labels::LabelScheme;
