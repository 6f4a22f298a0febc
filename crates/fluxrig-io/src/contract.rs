//! Experiment input/output contract types.
//!
//! Plans are authored as TOML; reports are written as JSON.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use fluxrig_core::{InductanceMatrix, OrchestratorConfig, TorqueSample};

/// Everything needed to characterize one machine model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentPlan {
    /// Problem file handed to the solver.
    pub problem: PathBuf,

    /// Number of phases; the inductance matrix is `phase_count²`.
    pub phase_count: usize,

    /// Current driven into one phase at a time for the inductance matrix (A).
    pub nominal_current: f64,

    /// Coercive field applied to every magnet before the torque sweep (A/m).
    /// `None` keeps the magnets as stored in the model.
    pub coercive: Option<f64>,

    /// Absolute rotor angles (radians) at which torque is measured.
    /// Empty skips the sweep.
    pub rotor_angles: Vec<f64>,

    /// Recovery, timeout and label settings.
    pub orchestrator: OrchestratorConfig,
}

impl Default for ExperimentPlan {
    fn default() -> Self {
        Self {
            problem: PathBuf::from("machine.pbm"),
            phase_count: 3,
            nominal_current: 5.0,
            coercive: None,
            rotor_angles: Vec::new(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// Results of a completed plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineReport {
    /// Problem the results belong to.
    pub problem: PathBuf,

    /// Self and mutual inductances (H).
    pub inductance: InductanceMatrix,

    /// Torque per rotor angle, in plan order.
    pub torque: Vec<TorqueSample>,

    /// Solver sessions rebuilt after failures during the run.
    pub session_resets: u32,
}

impl MachineReport {
    /// Largest torque magnitude of the sweep, if any.
    pub fn peak_torque(&self) -> Option<f64> {
        self.torque.iter().map(|s| s.torque).reduce(f64::max)
    }
}
