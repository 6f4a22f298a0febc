//! Field-integral measurements.
//!
//! Each measurement builds the contour from scratch, evaluates one
//! integral and clears the contour again; nothing carries over.

use fluxrig_session::{IntegralKind, SolverSession};
use fluxrig_types::{FluxrigResult, LabelScheme, PhaseId};

fn block_integral(
    session: &mut dyn SolverSession,
    label: &str,
    kind: IntegralKind,
) -> FluxrigResult<f64> {
    session.clear_contour()?;
    session.contour_add_block(label)?;
    let value = session.integral(kind)?.abs;
    session.clear_contour()?;
    Ok(value)
}

/// Flux linkage of `phase` from already analyzed results.
///
/// The `-` side's magnitude is subtracted from the `+` side's: its
/// excitation sign is inverted, so the difference is the phase total.
pub fn flux_linkage(
    session: &mut dyn SolverSession,
    labels: &LabelScheme,
    phase: PhaseId,
) -> FluxrigResult<f64> {
    let minus = block_integral(session, &labels.phase_minus(phase), IntegralKind::FluxLinkage)?;
    let plus = block_integral(session, &labels.phase_plus(phase), IntegralKind::FluxLinkage)?;
    Ok(plus - minus)
}

/// Maxwell torque magnitude on the airgap contour of analyzed results.
pub fn airgap_torque(session: &mut dyn SolverSession, labels: &LabelScheme) -> FluxrigResult<f64> {
    session.clear_contour()?;
    session.contour_add_edge(&labels.airgap_edge)?;
    let torque = session.integral(IntegralKind::MaxwellTorque)?.abs;
    session.clear_contour()?;
    Ok(torque)
}
