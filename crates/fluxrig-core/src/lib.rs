//! # fluxrig-core
//!
//! Fault-tolerant orchestration of excitation experiments on an external
//! field solver.
//!
//! ## Key Types
//!
//! - [`Orchestrator`] — owns the solver session and exposes the public operations
//! - [`OrchestratorConfig`] — retry policy, solve timeout, label naming
//! - [`InductanceMatrix`] — N×N result of the inductance experiment
//! - [`recovery::RetryPolicy`] — bounded retry with backoff

pub mod config;
pub mod excitation;
pub mod experiment;
pub mod magnets;
pub mod measure;
pub mod orchestrator;
pub mod recovery;
pub mod rotor;
pub mod setup;

pub use config::OrchestratorConfig;
pub use experiment::{InductanceMatrix, TorqueSample};
pub use orchestrator::Orchestrator;
pub use recovery::{Backoff, RetryPolicy};
