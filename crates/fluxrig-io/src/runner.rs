//! Plan runner.
//!
//! Executes a validated plan on an orchestrator:
//!
//! 1. load the problem
//! 2. torque sweep (magnets as planned), if angles are given
//! 3. inductance matrix (magnets disabled)
//!
//! The sweep runs first because the inductance experiment leaves the
//! magnets disabled.

use std::time::Instant;

use fluxrig_core::Orchestrator;
use fluxrig_types::FluxrigResult;

use crate::contract::{ExperimentPlan, MachineReport};
use crate::validator::validate_plan;

/// Runs `plan` and collects its results.
pub fn run_plan(orch: &mut Orchestrator, plan: &ExperimentPlan) -> FluxrigResult<MachineReport> {
    validate_plan(plan)?;
    let start = Instant::now();

    orch.load(&plan.problem)?;

    let torque = if plan.rotor_angles.is_empty() {
        Vec::new()
    } else {
        if let Some(h) = plan.coercive {
            let magnets = orch.set_magnets(true, h)?;
            tracing::info!(magnets, coercive = h, "magnets enabled for torque sweep");
        }
        orch.torque_sweep(&plan.rotor_angles)?
    };

    let inductance = orch.inductance_matrix(plan.phase_count, plan.nominal_current)?;

    let report = MachineReport {
        problem: plan.problem.clone(),
        inductance,
        torque,
        session_resets: orch.session_resets(),
    };
    tracing::info!(
        phases = plan.phase_count,
        points = report.torque.len(),
        resets = report.session_resets,
        elapsed = ?start.elapsed(),
        "plan finished"
    );
    Ok(report)
}
