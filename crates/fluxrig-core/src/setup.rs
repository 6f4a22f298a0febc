//! Model setup that has to survive a session rebuild.
//!
//! Reopening the problem brings back the model as stored on disk, which
//! forgets the magnets, rotor angle and currents that earlier calls set.
//! The orchestrator records each of those calls once it succeeds and
//! replays them, in call order, onto every rebuilt session.

use fluxrig_session::SolverSession;
use fluxrig_types::{FluxrigResult, PhaseId};

use crate::config::OrchestratorConfig;
use crate::{excitation, magnets, rotor};

/// One state-changing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetupAction {
    Magnets {
        enabled: bool,
        magnitude: f64,
    },
    Rotor {
        angle: f64,
    },
    PhaseCurrent {
        phase: PhaseId,
        current: f64,
        total_current: bool,
    },
}

impl SetupAction {
    /// True when applying `self` makes `older` irrelevant.
    fn supersedes(&self, older: &SetupAction) -> bool {
        match (self, older) {
            (SetupAction::Magnets { .. }, SetupAction::Magnets { .. })
            | (SetupAction::Rotor { .. }, SetupAction::Rotor { .. }) => true,
            (
                SetupAction::PhaseCurrent { phase: a, .. },
                SetupAction::PhaseCurrent { phase: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    pub fn apply(
        &self,
        session: &mut dyn SolverSession,
        config: &OrchestratorConfig,
    ) -> FluxrigResult<()> {
        match *self {
            SetupAction::Magnets { enabled, magnitude } => {
                magnets::set_magnets(
                    session,
                    &config.labels,
                    config.magnet_probe_limit,
                    enabled,
                    magnitude,
                )?;
            }
            SetupAction::Rotor { angle } => {
                rotor::rotate_to(session, config, angle)?;
            }
            SetupAction::PhaseCurrent {
                phase,
                current,
                total_current,
            } => {
                excitation::apply_phase_current(
                    session,
                    &config.labels,
                    phase,
                    current,
                    total_current,
                    config.current_decimals,
                )?;
            }
        }
        Ok(())
    }
}

/// Ordered, compacted list of setup actions.
#[derive(Debug, Clone, Default)]
pub struct SetupLog {
    actions: Vec<SetupAction>,
}

impl SetupLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action`, dropping earlier actions it supersedes.
    pub fn record(&mut self, action: SetupAction) {
        self.actions.retain(|old| !action.supersedes(old));
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[SetupAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Apply every action, oldest first.
    pub fn replay(
        &self,
        session: &mut dyn SolverSession,
        config: &OrchestratorConfig,
    ) -> FluxrigResult<()> {
        for action in &self.actions {
            action.apply(session, config)?;
        }
        Ok(())
    }
}
