//! Reference machine engine.
//!
//! An in-process [`SolverSession`] that stands in for a field solver.
//! It has no mesh or field numerics: a solve evaluates a linear lumped
//! model of a permanent-magnet machine instead,
//!
//! ```text
//! Ψ_i = Σ_j L[j][i] · I_j  +  Ψ_m · f · cos(p·θ − 2π·i/n)
//! T   = f · T_cog · sin(2p·θ)  −  p · Ψ_m · f · Σ_k I_k · sin(p·θ − 2π·k/n)
//! ```
//!
//! where `I_k` is the phase current read from the `+`/`-` blocks, `f` the
//! mean magnet strength relative to the nominal coercive field, `θ` the
//! rotor angle and `p` the pole-pair count. The phase blocks sit in a
//! vector-potential background `A₀`, so a flux-linkage integral over a
//! `+` block reports `A₀ + Ψ/2` and over a `-` block `A₀ − Ψ/2`.
//!
//! Beyond the numbers it enforces the engine's protocol: the model must
//! be loaded, the mesh rebuilt after geometry changes, results analyzed
//! before contours are used. This validates orchestration wiring without
//! an engine installed. Loading modes (total current vs. density) are
//! stored but do not change the model.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use serde::{Deserialize, Serialize};

use fluxrig_types::{FluxrigError, FluxrigResult, LabelKind, LabelScheme, MagnetId, PhaseId};

use crate::content::{BlockContent, Coercive};
use crate::fault::{Fault, FaultPlan, StubOperation};
use crate::integral::{IntegralKind, IntegralValue};
use crate::session::{SessionFactory, SolverSession};

/// Parameters of the reference machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StubMachineSpec {
    /// Region naming used by the model.
    pub labels: LabelScheme,
    /// Inductance matrix (H); `inductance[j][i]` couples phase j into phase i.
    pub inductance: Vec<Vec<f64>>,
    /// Number of magnet blocks.
    pub magnet_count: u32,
    /// Nominal coercive field of the magnets as stored in the model (A/m).
    pub coercive: f64,
    /// Phase flux linkage from the magnets at nominal coercive field (Wb).
    pub magnet_flux: f64,
    /// Cogging torque amplitude at nominal coercive field (N·m).
    pub cogging_torque: f64,
    pub pole_pairs: u32,
    /// Radius of the rotor boundary edge (m).
    pub rotor_radius: f64,
    /// Rotor angle when the problem is opened (rad).
    pub initial_angle: f64,
    /// Vector-potential background of the phase blocks (Wb). Must exceed
    /// half of any phase flux linkage for the `+`/`-` split to hold.
    pub potential_offset: f64,
    /// Whether the engine can enumerate its block labels.
    pub list_labels: bool,
}

impl Default for StubMachineSpec {
    fn default() -> Self {
        Self::with_phases(3)
    }
}

impl StubMachineSpec {
    /// A machine with `n` phases, self inductance 2 mH and weak
    /// negative mutual coupling.
    pub fn with_phases(n: usize) -> Self {
        let inductance = (0..n)
            .map(|j| {
                (0..n)
                    .map(|i| if i == j { 2.0e-3 } else { -0.4e-3 })
                    .collect()
            })
            .collect();
        Self {
            labels: LabelScheme::latin(),
            inductance,
            magnet_count: 4,
            coercive: 900_000.0,
            magnet_flux: 0.05,
            cogging_torque: 0.8,
            pole_pairs: 2,
            rotor_radius: 0.05,
            initial_angle: 0.0,
            potential_offset: 1.0,
            list_labels: false,
        }
    }

    pub fn phase_count(&self) -> usize {
        self.inductance.len()
    }

    /// Checks that the machine description is usable.
    pub fn validate(&self) -> FluxrigResult<()> {
        let n = self.inductance.len();
        if n == 0 {
            return Err(FluxrigError::InvalidConfig(
                "machine needs at least one phase".into(),
            ));
        }
        if self.inductance.iter().any(|row| row.len() != n) {
            return Err(FluxrigError::InvalidConfig(format!(
                "inductance matrix must be {n}x{n}"
            )));
        }
        if self.inductance.iter().flatten().any(|v| !v.is_finite()) {
            return Err(FluxrigError::InvalidConfig(
                "inductance matrix has non-finite entries".into(),
            ));
        }
        if !(self.rotor_radius > 0.0) {
            return Err(FluxrigError::InvalidConfig(
                "rotor radius must be positive".into(),
            ));
        }
        if self.pole_pairs == 0 {
            return Err(FluxrigError::InvalidConfig(
                "pole pair count must be >= 1".into(),
            ));
        }
        if !(self.potential_offset > 0.0) {
            return Err(FluxrigError::InvalidConfig(
                "potential offset must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Record of what the engine was asked to do, across all sessions.
#[derive(Debug, Clone, Default)]
pub struct StubJournal {
    /// Problems opened, in order.
    pub opened: Vec<PathBuf>,
    /// Number of `set_block_content` calls per label.
    pub block_writes: BTreeMap<String, u32>,
    /// Rotation angles applied to the rotor, in order.
    pub rotations: Vec<f64>,
    /// Successful solves.
    pub solves: u32,
    pub mesh_builds: u32,
}

impl StubJournal {
    pub fn writes_to(&self, label: &str) -> u32 {
        self.block_writes.get(label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct StubShared {
    plan: FaultPlan,
    journal: StubJournal,
}

fn lock(shared: &Mutex<StubShared>) -> MutexGuard<'_, StubShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Count the call and apply any fault scheduled for it.
fn checkpoint(shared: &Mutex<StubShared>, op: StubOperation) -> FluxrigResult<()> {
    let (fault, call) = {
        let mut s = lock(shared);
        let fault = s.plan.next(op);
        (fault, s.plan.calls(op))
    };
    if let Some(Fault::Hang(delay)) = fault {
        tracing::debug!(?op, call, ?delay, "stub engine hanging");
        thread::sleep(delay);
    }
    match fault.and_then(|f| f.into_error(op, call)) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug, Clone)]
enum ContourItem {
    Block(String),
    Edge(String),
}

#[derive(Debug, Clone)]
struct Field {
    phase_flux: Vec<f64>,
    torque: f64,
}

/// Mutable model of one opened problem.
#[derive(Debug, Clone)]
struct ModelState {
    blocks: BTreeMap<String, BlockContent>,
    rotor_angle: f64,
    meshed: bool,
    field: Option<Field>,
    analyzed: bool,
    contour: Vec<ContourItem>,
}

impl ModelState {
    fn pristine(spec: &StubMachineSpec) -> Self {
        let mut blocks = BTreeMap::new();
        for phase in PhaseId::range(spec.phase_count()) {
            let coil = BlockContent {
                total_current: true,
                ..BlockContent::default()
            };
            blocks.insert(spec.labels.phase_plus(phase), coil);
            blocks.insert(spec.labels.phase_minus(phase), coil);
        }
        for i in 0..spec.magnet_count as usize {
            let magnet = BlockContent {
                coercive: Coercive::new(spec.coercive, PI * i as f64),
                polar: true,
                ..BlockContent::default()
            };
            blocks.insert(spec.labels.magnet(MagnetId::from_index(i)), magnet);
        }
        blocks.insert("AIR".into(), BlockContent::default());
        blocks.insert("STEEL".into(), BlockContent::default());

        Self {
            blocks,
            rotor_angle: spec.initial_angle,
            meshed: true,
            field: None,
            analyzed: false,
            contour: Vec::new(),
        }
    }
}

/// In-process reference engine session.
pub struct LinearMachineStub {
    spec: Arc<StubMachineSpec>,
    shared: Arc<Mutex<StubShared>>,
    problem: PathBuf,
    /// Phase block label → (0-based phase, sign).
    phase_blocks: HashMap<String, (usize, f64)>,
    model: Option<ModelState>,
    disconnected: bool,
}

impl LinearMachineStub {
    /// Opens a standalone session with no fault injection.
    pub fn new(spec: StubMachineSpec, problem: impl Into<PathBuf>) -> FluxrigResult<Self> {
        spec.validate()?;
        Ok(Self::attach(
            Arc::new(spec),
            Arc::new(Mutex::new(StubShared::default())),
            problem.into(),
        ))
    }

    fn attach(
        spec: Arc<StubMachineSpec>,
        shared: Arc<Mutex<StubShared>>,
        problem: PathBuf,
    ) -> Self {
        let mut phase_blocks = HashMap::new();
        for phase in PhaseId::range(spec.phase_count()) {
            phase_blocks.insert(spec.labels.phase_plus(phase), (phase.index(), 1.0));
            phase_blocks.insert(spec.labels.phase_minus(phase), (phase.index(), -1.0));
        }
        Self {
            spec,
            shared,
            problem,
            phase_blocks,
            model: None,
            disconnected: false,
        }
    }

    /// Problem this session was opened on.
    pub fn problem(&self) -> &Path {
        &self.problem
    }

    /// Current rotor angle (radians), if the model is loaded.
    pub fn rotor_angle(&self) -> Option<f64> {
        self.model.as_ref().map(|m| m.rotor_angle)
    }

    fn enter(&mut self, op: StubOperation) -> FluxrigResult<()> {
        if self.disconnected {
            return Err(FluxrigError::ConnectionLost("engine is not running".into()));
        }
        let result = checkpoint(&self.shared, op);
        if matches!(result, Err(FluxrigError::ConnectionLost(_))) {
            self.disconnected = true;
        }
        result
    }

    fn model(&mut self) -> FluxrigResult<&mut ModelState> {
        self.model
            .as_mut()
            .ok_or_else(|| FluxrigError::Automation("model is not loaded".into()))
    }

    fn result_view(&mut self) -> FluxrigResult<&mut ModelState> {
        let model = self.model()?;
        if !model.analyzed {
            return Err(FluxrigError::Automation("no field window is open".into()));
        }
        Ok(model)
    }

    fn phase_currents(&self, model: &ModelState) -> Vec<f64> {
        let mut currents = vec![0.0; self.spec.phase_count()];
        for (label, &(index, sign)) in &self.phase_blocks {
            if let Some(block) = model.blocks.get(label) {
                currents[index] += sign * block.loading / 2.0;
            }
        }
        currents
    }

    fn magnet_strength(&self, model: &ModelState) -> f64 {
        if self.spec.magnet_count == 0 || self.spec.coercive == 0.0 {
            return 0.0;
        }
        let total: f64 = (0..self.spec.magnet_count as usize)
            .filter_map(|i| model.blocks.get(&self.spec.labels.magnet(MagnetId::from_index(i))))
            .map(|b| b.coercive.magnitude)
            .sum();
        total / (self.spec.magnet_count as f64 * self.spec.coercive)
    }

    fn evaluate(&self, model: &ModelState) -> Field {
        let spec = &self.spec;
        let n = spec.phase_count();
        let currents = self.phase_currents(model);
        let f = self.magnet_strength(model);
        let p = spec.pole_pairs as f64;
        let theta = model.rotor_angle;
        let shift = |k: usize| 2.0 * PI * k as f64 / n as f64;

        let phase_flux = (0..n)
            .map(|i| {
                let coupled: f64 = (0..n).map(|j| spec.inductance[j][i] * currents[j]).sum();
                coupled + spec.magnet_flux * f * (p * theta - shift(i)).cos()
            })
            .collect();

        let alignment: f64 = (0..n)
            .map(|k| currents[k] * (p * theta - shift(k)).sin())
            .sum();
        let torque = f * spec.cogging_torque * (2.0 * p * theta).sin()
            - p * spec.magnet_flux * f * alignment;

        Field { phase_flux, torque }
    }
}

impl SolverSession for LinearMachineStub {
    fn load_model(&mut self) -> FluxrigResult<()> {
        self.enter(StubOperation::LoadModel)?;
        self.model = Some(ModelState::pristine(&self.spec));
        Ok(())
    }

    fn build_mesh(&mut self) -> FluxrigResult<()> {
        self.enter(StubOperation::BuildMesh)?;
        self.model()?.meshed = true;
        lock(&self.shared).journal.mesh_builds += 1;
        Ok(())
    }

    fn block_content(&mut self, label: &str) -> FluxrigResult<BlockContent> {
        self.enter(StubOperation::BlockContent)?;
        self.model()?
            .blocks
            .get(label)
            .copied()
            .ok_or_else(|| FluxrigError::missing_block(label))
    }

    fn set_block_content(&mut self, label: &str, content: BlockContent) -> FluxrigResult<()> {
        self.enter(StubOperation::SetBlockContent)?;
        let slot = self
            .model()?
            .blocks
            .get_mut(label)
            .ok_or_else(|| FluxrigError::missing_block(label))?;
        *slot = content;
        *lock(&self.shared)
            .journal
            .block_writes
            .entry(label.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn block_labels(&mut self) -> FluxrigResult<Option<Vec<String>>> {
        if !self.spec.list_labels {
            return Ok(None);
        }
        Ok(Some(self.model()?.blocks.keys().cloned().collect()))
    }

    fn solve(&mut self) -> FluxrigResult<()> {
        self.enter(StubOperation::Solve)?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| FluxrigError::Automation("model is not loaded".into()))?;
        if !model.meshed {
            return Err(FluxrigError::Automation(
                "mesh is out of date with the geometry".into(),
            ));
        }
        let field = self.evaluate(model);
        let model = self.model()?;
        model.field = Some(field);
        model.analyzed = false;
        model.contour.clear();
        lock(&self.shared).journal.solves += 1;
        Ok(())
    }

    fn analyze_results(&mut self) -> FluxrigResult<()> {
        self.enter(StubOperation::AnalyzeResults)?;
        let model = self.model()?;
        if model.field.is_none() {
            return Err(FluxrigError::Automation("problem has no results".into()));
        }
        model.analyzed = true;
        Ok(())
    }

    fn clear_contour(&mut self) -> FluxrigResult<()> {
        self.result_view()?.contour.clear();
        Ok(())
    }

    fn contour_add_block(&mut self, label: &str) -> FluxrigResult<()> {
        let model = self.result_view()?;
        if !model.blocks.contains_key(label) {
            return Err(FluxrigError::missing_block(label));
        }
        model.contour.push(ContourItem::Block(label.to_string()));
        Ok(())
    }

    fn contour_add_edge(&mut self, label: &str) -> FluxrigResult<()> {
        let airgap = self.spec.labels.airgap_edge.clone();
        let model = self.result_view()?;
        if label != airgap {
            return Err(FluxrigError::LabelNotFound {
                kind: LabelKind::Edge,
                name: label.to_string(),
            });
        }
        model.contour.push(ContourItem::Edge(label.to_string()));
        Ok(())
    }

    fn integral(&mut self, kind: IntegralKind) -> FluxrigResult<IntegralValue> {
        self.enter(StubOperation::Integral)?;
        let offset = self.spec.potential_offset;
        let airgap = self.spec.labels.airgap_edge.clone();
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| FluxrigError::Automation("model is not loaded".into()))?;
        let field = match (&model.field, model.analyzed) {
            (Some(field), true) => field,
            _ => {
                return Err(FluxrigError::PreconditionViolated(
                    "no analyzed results to integrate".into(),
                ))
            }
        };

        match kind {
            IntegralKind::FluxLinkage => {
                let value = match model.contour.as_slice() {
                    [ContourItem::Block(label)] => match self.phase_blocks.get(label) {
                        Some(&(index, sign)) => offset + sign * field.phase_flux[index] / 2.0,
                        None => offset,
                    },
                    [] => return Err(FluxrigError::Automation("contour is empty".into())),
                    _ => {
                        return Err(FluxrigError::Automation(
                            "flux linkage needs a single block in the contour".into(),
                        ))
                    }
                };
                Ok(IntegralValue::from_signed(value))
            }
            IntegralKind::MaxwellTorque => {
                let closed = model
                    .contour
                    .iter()
                    .any(|item| matches!(item, ContourItem::Edge(e) if *e == airgap));
                if !closed {
                    return Err(FluxrigError::Automation(
                        "torque needs the airgap edge in the contour".into(),
                    ));
                }
                Ok(IntegralValue::from_signed(field.torque))
            }
        }
    }

    fn labeled_vertex_angle(&mut self, label: &str) -> FluxrigResult<f64> {
        if label != self.spec.labels.angle_vertex {
            return Err(FluxrigError::LabelNotFound {
                kind: LabelKind::Vertex,
                name: label.to_string(),
            });
        }
        Ok(self.model()?.rotor_angle)
    }

    fn labeled_edge_radius(&mut self, label: &str) -> FluxrigResult<f64> {
        if label != self.spec.labels.airgap_edge {
            return Err(FluxrigError::LabelNotFound {
                kind: LabelKind::Edge,
                name: label.to_string(),
            });
        }
        self.model()?;
        Ok(self.spec.rotor_radius)
    }

    fn rotate_within(&mut self, radius: f64, angle: f64) -> FluxrigResult<()> {
        self.enter(StubOperation::Rotate)?;
        let rotor_radius = self.spec.rotor_radius;
        let model = self.model()?;
        if radius + 1e-9 < rotor_radius {
            // Selection misses the rotor; only air is moved.
            return Ok(());
        }
        model.rotor_angle += angle;
        model.meshed = false;
        model.field = None;
        model.analyzed = false;
        model.contour.clear();
        lock(&self.shared).journal.rotations.push(angle);
        Ok(())
    }

    fn name(&self) -> &str {
        "linear_machine_stub"
    }
}

/// Opens [`LinearMachineStub`] sessions that share one fault plan and
/// one journal. Each open starts from the pristine model, as reopening
/// the problem file would.
#[derive(Clone)]
pub struct StubFactory {
    spec: Arc<StubMachineSpec>,
    shared: Arc<Mutex<StubShared>>,
}

impl StubFactory {
    pub fn new(spec: StubMachineSpec) -> FluxrigResult<Self> {
        spec.validate()?;
        Ok(Self {
            spec: Arc::new(spec),
            shared: Arc::new(Mutex::new(StubShared::default())),
        })
    }

    /// Replace the fault plan.
    pub fn with_faults(self, plan: FaultPlan) -> Self {
        lock(&self.shared).plan = plan;
        self
    }

    /// Snapshot of everything the engine was asked to do so far.
    pub fn journal(&self) -> StubJournal {
        lock(&self.shared).journal.clone()
    }

    /// How many times `op` has been called across all sessions.
    pub fn calls(&self, op: StubOperation) -> u32 {
        lock(&self.shared).plan.calls(op)
    }

    pub fn spec(&self) -> &StubMachineSpec {
        &self.spec
    }
}

impl SessionFactory for StubFactory {
    fn open(&self, problem: &Path) -> FluxrigResult<Box<dyn SolverSession>> {
        checkpoint(&self.shared, StubOperation::Open)?;
        lock(&self.shared).journal.opened.push(problem.to_path_buf());
        Ok(Box::new(LinearMachineStub::attach(
            Arc::clone(&self.spec),
            Arc::clone(&self.shared),
            problem.to_path_buf(),
        )))
    }

    fn name(&self) -> &str {
        "linear_machine_stub"
    }
}
