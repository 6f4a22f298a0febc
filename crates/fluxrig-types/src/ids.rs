//! Strongly-typed identifiers for model regions.
//!
//! Phases and magnets are both addressed by 1-based indices inside
//! label names; newtypes keep them from being mixed up with each other
//! or with 0-based loop counters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FluxrigError, FluxrigResult};

/// 1-based stator phase number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PhaseId(u32);

/// 1-based magnet number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MagnetId(pub u32);

impl PhaseId {
    /// Creates a phase id, rejecting zero.
    pub fn new(number: u32) -> FluxrigResult<Self> {
        if number == 0 {
            return Err(FluxrigError::PreconditionViolated(
                "phase numbers start at 1".into(),
            ));
        }
        Ok(Self(number))
    }

    /// All phases `1..=count`, in order.
    pub fn range(count: usize) -> impl Iterator<Item = PhaseId> {
        (1..=count as u32).map(PhaseId)
    }

    /// The 1-based number used in label names.
    #[inline]
    pub fn number(self) -> u32 {
        self.0
    }

    /// The 0-based index for matrix addressing.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl MagnetId {
    /// Magnet id for a 0-based position in the magnet set.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u32> for PhaseId {
    type Error = FluxrigError;

    fn try_from(val: u32) -> FluxrigResult<Self> {
        Self::new(val)
    }
}

impl From<PhaseId> for u32 {
    fn from(id: PhaseId) -> u32 {
        id.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MagnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
