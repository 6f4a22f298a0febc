//! # fluxrig-io
//!
//! Experiment plan and machine report contract, plan validation and the
//! plan runner.
//!
//! Defines the boundary types that external callers (CLI, batch scripts)
//! use to drive the orchestrator without touching its API directly.

pub mod contract;
pub mod runner;
pub mod validator;

pub use contract::{ExperimentPlan, MachineReport};
pub use runner::run_plan;
pub use validator::validate_plan;
