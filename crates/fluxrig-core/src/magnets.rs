//! Magnet discovery and control.
//!
//! Magnets are the blocks `<prefix>1, <prefix>2, …`; the set is contiguous
//! and its size is never cached. Every operation rediscovers it.

use std::f64::consts::PI;

use fluxrig_session::{Coercive, SolverSession};
use fluxrig_types::{FluxrigError, FluxrigResult, LabelKind, LabelScheme, MagnetId};

/// Find the magnet set of the loaded model.
///
/// Uses the engine's block listing when it has one; otherwise probes
/// `<prefix>1, <prefix>2, …` until a lookup misses. The miss ends the
/// set and is not an error. Probing more than `probe_limit` names without
/// a miss is reported as a precondition failure.
pub fn discover(
    session: &mut dyn SolverSession,
    labels: &LabelScheme,
    probe_limit: u32,
) -> FluxrigResult<Vec<MagnetId>> {
    if let Some(names) = session.block_labels()? {
        let mut present: Vec<u32> = names
            .iter()
            .filter_map(|name| labels.parse_magnet(name))
            .map(|m| m.0)
            .collect();
        present.sort_unstable();
        present.dedup();
        // Contiguous from 1: stop at the first gap.
        let count = present
            .iter()
            .enumerate()
            .take_while(|&(i, &n)| n == i as u32 + 1)
            .count();
        tracing::debug!(count, "magnets listed");
        return Ok((0..count).map(MagnetId::from_index).collect());
    }

    let mut found = Vec::new();
    for n in 1..=probe_limit {
        let magnet = MagnetId(n);
        match session.block_content(&labels.magnet(magnet)) {
            Ok(_) => found.push(magnet),
            Err(e) if e.is_label_miss(LabelKind::Block) => {
                tracing::debug!(count = found.len(), "magnets probed");
                return Ok(found);
            }
            Err(e) => return Err(e),
        }
    }
    Err(FluxrigError::PreconditionViolated(format!(
        "more than {probe_limit} magnets found while probing '{}N'",
        labels.magnet_prefix
    )))
}

/// Enable (coercive field `magnitude`) or disable (zero) every magnet,
/// pointing all of them at angle 0. The polar flag is left as it is.
///
/// Returns the number of magnets written.
pub fn set_magnets(
    session: &mut dyn SolverSession,
    labels: &LabelScheme,
    probe_limit: u32,
    enabled: bool,
    magnitude: f64,
) -> FluxrigResult<usize> {
    let magnets = discover(session, labels, probe_limit)?;
    let strength = if enabled { magnitude } else { 0.0 };
    for &magnet in &magnets {
        let label = labels.magnet(magnet);
        let mut content = session.block_content(&label)?;
        content.coercive = Coercive::new(strength, 0.0);
        session.set_block_content(&label, content)?;
    }
    Ok(magnets.len())
}

/// Give magnet `i` (0-based) the direction `π·i` in polar coordinates,
/// keeping its magnitude. Adjacent poles end up opposed.
pub fn orient_for_rotation(
    session: &mut dyn SolverSession,
    labels: &LabelScheme,
    probe_limit: u32,
) -> FluxrigResult<usize> {
    let magnets = discover(session, labels, probe_limit)?;
    for &magnet in &magnets {
        let label = labels.magnet(magnet);
        let mut content = session.block_content(&label)?;
        content.coercive = Coercive::new(content.coercive.magnitude, PI * magnet.index() as f64);
        content.polar = true;
        session.set_block_content(&label, content)?;
    }
    Ok(magnets.len())
}
