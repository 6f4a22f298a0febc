//! Label naming conventions inside a solver model.
//!
//! The orchestrator never hard-codes region names; it asks a
//! [`LabelScheme`] for them. Models authored with the legacy Cyrillic
//! names and models using the Latin names differ only here.

use serde::{Deserialize, Serialize};

use crate::ids::{MagnetId, PhaseId};

/// Names of the labeled regions the orchestrator touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelScheme {
    /// Prefix of phase block labels; `<prefix><n>+` and `<prefix><n>-`.
    pub phase_prefix: String,
    /// Prefix of magnet block labels; `<prefix><n>` for n = 1, 2, ...
    pub magnet_prefix: String,
    /// Vertex label whose polar angle is the rotor reference angle.
    pub angle_vertex: String,
    /// Edge label on the airgap boundary; its radius bounds the rotor.
    pub airgap_edge: String,
}

impl Default for LabelScheme {
    fn default() -> Self {
        Self::latin()
    }
}

impl LabelScheme {
    /// `PHASE_`, `MAGNET_`, `ANGLE`, `CONTOUR`.
    pub fn latin() -> Self {
        Self {
            phase_prefix: "PHASE_".into(),
            magnet_prefix: "MAGNET_".into(),
            angle_vertex: "ANGLE".into(),
            airgap_edge: "CONTOUR".into(),
        }
    }

    /// `ФАЗА_`, `МАГНИТ_`, `УГОЛ`, `КОНТУР` — legacy model naming.
    pub fn cyrillic() -> Self {
        Self {
            phase_prefix: "ФАЗА_".into(),
            magnet_prefix: "МАГНИТ_".into(),
            angle_vertex: "УГОЛ".into(),
            airgap_edge: "КОНТУР".into(),
        }
    }

    /// Block carrying the positive excitation of `phase`.
    pub fn phase_plus(&self, phase: PhaseId) -> String {
        format!("{}{}+", self.phase_prefix, phase)
    }

    /// Block carrying the negative excitation of `phase`.
    pub fn phase_minus(&self, phase: PhaseId) -> String {
        format!("{}{}-", self.phase_prefix, phase)
    }

    pub fn magnet(&self, magnet: MagnetId) -> String {
        format!("{}{}", self.magnet_prefix, magnet)
    }

    /// Parses a magnet label back into its id, if it follows the scheme.
    pub fn parse_magnet(&self, label: &str) -> Option<MagnetId> {
        let digits = label.strip_prefix(self.magnet_prefix.as_str())?;
        match digits.parse::<u32>() {
            // Only the canonical spelling names a magnet; `MAGNET_01` does not.
            Ok(n) if n > 0 && digits == n.to_string() => Some(MagnetId(n)),
            _ => None,
        }
    }
}
