//! Phase excitation.
//!
//! A phase is driven through its two coil-side blocks, which always carry
//! exactly opposite loadings.

use fluxrig_session::SolverSession;
use fluxrig_types::{FluxrigError, FluxrigResult, LabelScheme, PhaseId};

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Write `+current` to the phase's `+` block and `-current` to its `-`
/// block, both parallel-connected in the given loading mode.
///
/// Only the session's model is changed; nothing is solved.
pub fn apply_phase_current(
    session: &mut dyn SolverSession,
    labels: &LabelScheme,
    phase: PhaseId,
    current: f64,
    total_current: bool,
    decimals: u32,
) -> FluxrigResult<()> {
    if !current.is_finite() {
        return Err(FluxrigError::PreconditionViolated(format!(
            "phase {phase} current must be finite, got {current}"
        )));
    }
    let plus = round_to(current, decimals);

    for (label, loading) in [
        (labels.phase_minus(phase), -plus),
        (labels.phase_plus(phase), plus),
    ] {
        let mut content = session.block_content(&label)?;
        content.loading = loading;
        content.total_current = total_current;
        content.serial = false;
        session.set_block_content(&label, content)?;
    }
    Ok(())
}
