//! Field integrals evaluated over a contour.

use serde::{Deserialize, Serialize};

/// Integral quantities the orchestrator asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegralKind {
    /// Flux linkage of the blocks in the contour (Wb).
    FluxLinkage,
    /// Maxwell-stress torque on a closed contour (N·m).
    MaxwellTorque,
}

/// Value of a field integral as the engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegralValue {
    /// Signed value.
    pub value: f64,
    /// Magnitude.
    pub abs: f64,
}

impl IntegralValue {
    pub fn from_signed(value: f64) -> Self {
        Self {
            value,
            abs: value.abs(),
        }
    }
}
