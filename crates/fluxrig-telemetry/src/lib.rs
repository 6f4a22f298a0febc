//! # fluxrig-telemetry
//!
//! Event bus for orchestration telemetry. Emits structured events
//! (calls, session openings, failures, measurements) that pluggable
//! sinks consume: the append-only session log, `tracing`, or an
//! in-memory buffer for tests.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, OrchestrationEvent};
pub use sinks::{EventSink, LogFileSink, TracingSink, VecSink};
