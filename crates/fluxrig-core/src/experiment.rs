//! Multi-solve experiments.
//!
//! ## Inductance matrix
//!
//! With the magnets disabled, each phase j in turn carries the nominal
//! current while every other phase carries none. After the solve, the
//! flux linkage of every phase i gives `L[j][i] = |Ψ_i / I_nom|`:
//!
//! ```text
//! disable magnets
//! for j in 1..=N:
//!     set I_k = (k == j ? I_nom : 0) for all k
//!     solve, analyze
//!     for i in 1..=N: L[j][i] = |Ψ_i / I_nom|
//! ```
//!
//! All excitations of a row are written before its solve, and every
//! measurement of a row happens after it. The whole matrix is one
//! restartable unit: a failure in row 7 restarts from row 1.

use serde::{Deserialize, Serialize};

use fluxrig_telemetry::EventKind;
use fluxrig_types::{FluxrigError, FluxrigResult, PhaseId};

use crate::orchestrator::Orchestrator;
use crate::setup::SetupAction;
use crate::{excitation, magnets, measure};

/// Square matrix of self and mutual inductances, row-major.
///
/// Row j is the response of every phase to excitation of phase j alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl InductanceMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Builds a matrix from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> FluxrigResult<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return Err(FluxrigError::InvalidConfig(format!(
                "inductance matrix must be {size}x{size}"
            )));
        }
        Ok(Self {
            size,
            values: rows.iter().flatten().copied().collect(),
        })
    }

    /// Number of phases.
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.size + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.size..(row + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.size.max(1))
    }

    /// Self inductances.
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.size).map(|i| self.get(i, i)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    pub fn is_non_negative(&self) -> bool {
        self.values.iter().all(|&v| v >= 0.0)
    }

    /// True when each self inductance exceeds every mutual term of its row.
    pub fn is_diagonally_dominant(&self) -> bool {
        (0..self.size).all(|r| {
            let d = self.get(r, r);
            (0..self.size).filter(|&c| c != r).all(|c| d > self.get(r, c))
        })
    }
}

/// Torque at one rotor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorqueSample {
    /// Rotor angle (radians).
    pub angle: f64,
    /// Torque magnitude (N·m).
    pub torque: f64,
}

impl Orchestrator {
    /// Inductance matrix of an `phases`-phase machine at `nominal` current.
    pub fn inductance_matrix(&mut self, phases: usize, nominal: f64) -> FluxrigResult<InductanceMatrix> {
        if phases == 0 {
            return Err(FluxrigError::PreconditionViolated(
                "inductance matrix needs at least one phase".into(),
            ));
        }
        if !(nominal.is_finite() && nominal != 0.0) {
            return Err(FluxrigError::PreconditionViolated(format!(
                "nominal current must be finite and non-zero, got {nominal}"
            )));
        }

        let detail = format!("phases={phases}, nominal={nominal}");
        let matrix = self.guarded("inductance_matrix", detail, move |o| {
            o.measure_inductance(phases, nominal)
        })?;

        self.record_setup(SetupAction::Magnets {
            enabled: false,
            magnitude: 0.0,
        });
        for phase in PhaseId::range(phases) {
            self.record_setup(SetupAction::PhaseCurrent {
                phase,
                current: if phase.index() + 1 == phases { nominal } else { 0.0 },
                total_current: true,
            });
        }
        Ok(matrix)
    }

    /// Three-phase [`inductance_matrix`](Self::inductance_matrix).
    pub fn inductance_matrix_3(&mut self, nominal: f64) -> FluxrigResult<InductanceMatrix> {
        self.inductance_matrix(3, nominal)
    }

    /// Nine-phase [`inductance_matrix`](Self::inductance_matrix).
    pub fn inductance_matrix_9(&mut self, nominal: f64) -> FluxrigResult<InductanceMatrix> {
        self.inductance_matrix(9, nominal)
    }

    /// Torque at each absolute rotor angle in `angles`, in order.
    ///
    /// Each point (rotate, then solve and measure) is restartable on its
    /// own; earlier points are kept when a later one is retried.
    pub fn torque_sweep(&mut self, angles: &[f64]) -> FluxrigResult<Vec<TorqueSample>> {
        if let Some(bad) = angles.iter().find(|a| !a.is_finite()) {
            return Err(FluxrigError::PreconditionViolated(format!(
                "rotor angle must be finite, got {bad}"
            )));
        }
        let mut samples = Vec::with_capacity(angles.len());
        for &angle in angles {
            let torque = self.guarded("torque_sweep", format!("angle={angle}"), move |o| {
                o.rotate_now(angle)?;
                o.measure_torque()
            })?;
            self.record_setup(SetupAction::Rotor { angle });
            self.bus_mut().record(EventKind::Measurement {
                quantity: format!("torque@{angle:.4}"),
                value: torque,
            });
            samples.push(TorqueSample { angle, torque });
        }
        self.bus_mut().flush();
        Ok(samples)
    }

    fn measure_inductance(&mut self, phases: usize, nominal: f64) -> FluxrigResult<InductanceMatrix> {
        {
            let (session, config) = self.parts()?;
            magnets::set_magnets(session, &config.labels, config.magnet_probe_limit, false, 0.0)?;
        }

        let mut matrix = InductanceMatrix::zeros(phases);
        for driven in PhaseId::range(phases) {
            {
                let (session, config) = self.parts()?;
                for phase in PhaseId::range(phases) {
                    let current = if phase == driven { nominal } else { 0.0 };
                    excitation::apply_phase_current(
                        session,
                        &config.labels,
                        phase,
                        current,
                        true,
                        config.current_decimals,
                    )?;
                }
            }

            self.solve_and_analyze()?;

            let (session, config) = self.parts()?;
            for measured in PhaseId::range(phases) {
                let psi = measure::flux_linkage(session, &config.labels, measured)?;
                matrix.set(driven.index(), measured.index(), (psi / nominal).abs());
            }
        }
        Ok(matrix)
    }
}
