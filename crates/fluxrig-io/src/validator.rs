//! Plan validation.
//!
//! Checks a plan before any solver session is opened, so that a typo in
//! the plan fails in milliseconds instead of after the first solve.

use fluxrig_types::{FluxrigError, FluxrigResult};

use crate::contract::ExperimentPlan;

/// Validates a complete experiment plan.
///
/// Checks:
/// - Problem path and phase count are present
/// - Nominal current is finite and non-zero
/// - Coercive field (if any) is finite and non-negative
/// - Every rotor angle is finite
/// - Orchestrator settings are in range
pub fn validate_plan(plan: &ExperimentPlan) -> FluxrigResult<()> {
    if plan.problem.as_os_str().is_empty() {
        return Err(FluxrigError::InvalidConfig(
            "Problem path must not be empty".into(),
        ));
    }
    if plan.phase_count == 0 {
        return Err(FluxrigError::InvalidConfig(
            "Phase count must be >= 1".into(),
        ));
    }
    if !plan.nominal_current.is_finite() || plan.nominal_current == 0.0 {
        return Err(FluxrigError::InvalidConfig(format!(
            "Nominal current must be finite and non-zero, got {}",
            plan.nominal_current
        )));
    }
    if let Some(h) = plan.coercive {
        if !(h.is_finite() && h >= 0.0) {
            return Err(FluxrigError::InvalidConfig(format!(
                "Coercive field must be finite and non-negative, got {h}"
            )));
        }
    }
    if let Some((i, angle)) = plan
        .rotor_angles
        .iter()
        .enumerate()
        .find(|(_, a)| !a.is_finite())
    {
        return Err(FluxrigError::InvalidConfig(format!(
            "Rotor angle #{} is not finite ({angle})",
            i + 1
        )));
    }

    plan.orchestrator.validate()
}
