//! Rotor positioning.

use fluxrig_session::SolverSession;
use fluxrig_types::{FluxrigError, FluxrigResult};

use crate::config::OrchestratorConfig;
use crate::magnets;

/// Turn the rotor to the absolute angle `target` (radians).
///
/// The current angle is re-measured from the angle marker on every call,
/// so the applied delta is `target − current` and repeating a call is a
/// no-op up to rounding. Magnets are re-oriented and the mesh rebuilt
/// afterwards; any previous results are stale.
///
/// Returns the delta that was applied.
pub fn rotate_to(
    session: &mut dyn SolverSession,
    config: &OrchestratorConfig,
    target: f64,
) -> FluxrigResult<f64> {
    if !target.is_finite() {
        return Err(FluxrigError::PreconditionViolated(format!(
            "rotor angle must be finite, got {target}"
        )));
    }
    let labels = &config.labels;
    let current = session.labeled_vertex_angle(&labels.angle_vertex)?;
    let radius = session.labeled_edge_radius(&labels.airgap_edge)?;
    let delta = target - current;
    session.rotate_within(radius, delta)?;
    magnets::orient_for_rotation(session, labels, config.magnet_probe_limit)?;
    session.build_mesh()?;
    tracing::debug!(target, current, delta, radius, "rotor rotated");
    Ok(delta)
}
