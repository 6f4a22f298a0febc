//! Block content records.
//!
//! The engine hands out a copy of a block's content and only accepts a
//! whole record back, so every mutation is fetch → edit → assign.

use serde::{Deserialize, Serialize};

/// Coercive field vector of a magnet region, in polar form.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coercive {
    /// Field magnitude (A/m). Zero disables the magnet.
    pub magnitude: f64,
    /// Direction (radians).
    pub angle: f64,
}

impl Coercive {
    pub fn new(magnitude: f64, angle: f64) -> Self {
        Self { magnitude, angle }
    }
}

/// Excitation and material data attached to a block label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockContent {
    /// Source loading: total current (A) or current density (A/m²).
    pub loading: f64,
    /// `true` when `loading` is a total current rather than a density.
    pub total_current: bool,
    /// Series (`true`) or parallel conductor connection.
    pub serial: bool,
    /// Magnet remanence.
    pub coercive: Coercive,
    /// Coercive direction is given in polar coordinates.
    pub polar: bool,
}
