//! # fluxrig-session
//!
//! The boundary between fluxrig and an external field solver.
//!
//! ## Key Types
//!
//! - [`SolverSession`] — one live connection to an opened problem
//! - [`SessionFactory`] — opens sessions; called again on every reset
//! - [`BlockContent`] — the whole-record excitation/material data of a block
//! - [`stub::LinearMachineStub`] — in-process reference engine with fault injection

pub mod content;
pub mod fault;
pub mod integral;
pub mod session;
pub mod stub;

pub use content::{BlockContent, Coercive};
pub use fault::{Fault, FaultPlan, StubOperation};
pub use integral::{IntegralKind, IntegralValue};
pub use session::{SessionFactory, SolverSession};
pub use stub::{LinearMachineStub, StubFactory, StubJournal, StubMachineSpec};
