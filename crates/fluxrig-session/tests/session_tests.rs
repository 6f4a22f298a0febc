//! Integration tests for fluxrig-session.

use std::path::Path;

use fluxrig_session::{
    BlockContent, FaultPlan, IntegralKind, LinearMachineStub, SessionFactory, SolverSession,
    StubFactory, StubMachineSpec, StubOperation,
};
use fluxrig_types::{FluxrigError, LabelKind};

fn loaded_stub() -> LinearMachineStub {
    let mut stub = LinearMachineStub::new(StubMachineSpec::default(), "machine.pbm").unwrap();
    stub.load_model().unwrap();
    stub
}

fn excite(stub: &mut LinearMachineStub, phase: u32, current: f64) {
    for (suffix, sign) in [("+", 1.0), ("-", -1.0)] {
        let label = format!("PHASE_{phase}{suffix}");
        let mut c = stub.block_content(&label).unwrap();
        c.loading = sign * current;
        stub.set_block_content(&label, c).unwrap();
    }
}

fn flux_integral(stub: &mut LinearMachineStub, label: &str) -> f64 {
    stub.clear_contour().unwrap();
    stub.contour_add_block(label).unwrap();
    stub.integral(IntegralKind::FluxLinkage).unwrap().abs
}

// ─── Spec Tests ───────────────────────────────────────────────

#[test]
fn default_spec_is_three_phase() {
    let spec = StubMachineSpec::default();
    assert_eq!(spec.phase_count(), 3);
    assert!(spec.validate().is_ok());
}

#[test]
fn non_square_inductance_rejected() {
    let mut spec = StubMachineSpec::default();
    spec.inductance[1].pop();
    assert!(matches!(spec.validate(), Err(FluxrigError::InvalidConfig(_))));
}

#[test]
fn spec_from_toml_fills_defaults() {
    let spec: StubMachineSpec = toml::from_str(
        r#"
        magnet_count = 6
        inductance = [[1.0e-3, 0.0], [0.0, 1.0e-3]]
        "#,
    )
    .unwrap();
    assert_eq!(spec.phase_count(), 2);
    assert_eq!(spec.magnet_count, 6);
    assert_eq!(spec.labels.phase_prefix, "PHASE_");
}

// ─── Protocol Tests ───────────────────────────────────────────

#[test]
fn content_requires_loaded_model() {
    let mut stub = LinearMachineStub::new(StubMachineSpec::default(), "m.pbm").unwrap();
    assert!(matches!(
        stub.block_content("PHASE_1+"),
        Err(FluxrigError::Automation(_))
    ));
}

#[test]
fn missing_block_is_label_miss() {
    let mut stub = loaded_stub();
    let err = stub.block_content("MAGNET_5").unwrap_err();
    assert!(err.is_label_miss(LabelKind::Block));
    assert!(stub.block_content("MAGNET_4").is_ok());
}

#[test]
fn integral_before_solve_is_precondition() {
    let mut stub = loaded_stub();
    assert!(stub.clear_contour().is_err());
    assert!(matches!(
        stub.integral(IntegralKind::FluxLinkage),
        Err(FluxrigError::PreconditionViolated(_))
    ));
}

#[test]
fn solve_needs_fresh_mesh_after_rotation() {
    let mut stub = loaded_stub();
    stub.rotate_within(0.05, 0.3).unwrap();
    assert!(stub.solve().is_err());
    stub.build_mesh().unwrap();
    assert!(stub.solve().is_ok());
    assert!((stub.rotor_angle().unwrap() - 0.3).abs() < 1e-12);
}

#[test]
fn rotation_outside_rotor_moves_nothing() {
    let mut stub = loaded_stub();
    stub.rotate_within(0.01, 1.0).unwrap();
    assert_eq!(stub.rotor_angle(), Some(0.0));
    assert!(stub.solve().is_ok());
}

// ─── Physics Tests ────────────────────────────────────────────

#[test]
fn coil_sides_split_flux_around_offset() {
    let mut spec = StubMachineSpec::default();
    spec.magnet_count = 0;
    let mut stub = LinearMachineStub::new(spec, "m.pbm").unwrap();
    stub.load_model().unwrap();
    excite(&mut stub, 1, 5.0);
    stub.solve().unwrap();
    stub.analyze_results().unwrap();

    let plus = flux_integral(&mut stub, "PHASE_1+");
    let minus = flux_integral(&mut stub, "PHASE_1-");
    // Ψ₁ = L₁₁ · I = 2e-3 · 5
    assert!((plus - minus - 1.0e-2).abs() < 1e-12);

    let plus2 = flux_integral(&mut stub, "PHASE_2+");
    let minus2 = flux_integral(&mut stub, "PHASE_2-");
    assert!((plus2 - minus2 + 2.0e-3).abs() < 1e-12);
}

#[test]
fn disabled_magnets_produce_no_torque() {
    let mut stub = loaded_stub();
    for i in 1..=4 {
        let label = format!("MAGNET_{i}");
        let mut c = stub.block_content(&label).unwrap();
        c.coercive.magnitude = 0.0;
        stub.set_block_content(&label, c).unwrap();
    }
    stub.rotate_within(0.05, 0.2).unwrap();
    stub.build_mesh().unwrap();
    stub.solve().unwrap();
    stub.analyze_results().unwrap();
    stub.clear_contour().unwrap();
    stub.contour_add_edge("CONTOUR").unwrap();
    let torque = stub.integral(IntegralKind::MaxwellTorque).unwrap();
    assert_eq!(torque.abs, 0.0);
}

#[test]
fn torque_needs_airgap_contour() {
    let mut stub = loaded_stub();
    stub.solve().unwrap();
    stub.analyze_results().unwrap();
    stub.clear_contour().unwrap();
    stub.contour_add_block("AIR").unwrap();
    assert!(stub.integral(IntegralKind::MaxwellTorque).is_err());
    assert!(stub.contour_add_edge("RING").is_err());
}

#[test]
fn listing_exposes_all_blocks() {
    let mut spec = StubMachineSpec::default();
    spec.list_labels = true;
    let mut stub = LinearMachineStub::new(spec, "m.pbm").unwrap();
    stub.load_model().unwrap();
    let labels = stub.block_labels().unwrap().unwrap();
    assert!(labels.iter().any(|l| l == "MAGNET_4"));
    assert!(labels.iter().any(|l| l == "PHASE_3-"));
}

// ─── Factory & Fault Tests ────────────────────────────────────

#[test]
fn factory_journals_opens_and_writes() {
    let factory = StubFactory::new(StubMachineSpec::default()).unwrap();
    let mut session = factory.open(Path::new("a.pbm")).unwrap();
    session.load_model().unwrap();
    session
        .set_block_content("PHASE_1+", BlockContent::default())
        .unwrap();
    let _second = factory.open(Path::new("a.pbm")).unwrap();

    let journal = factory.journal();
    assert_eq!(journal.opened.len(), 2);
    assert_eq!(journal.writes_to("PHASE_1+"), 1);
    assert_eq!(journal.writes_to("PHASE_1-"), 0);
}

#[test]
fn reopened_session_starts_pristine() {
    let factory = StubFactory::new(StubMachineSpec::default()).unwrap();
    let mut first = factory.open(Path::new("a.pbm")).unwrap();
    first.load_model().unwrap();
    let mut c = first.block_content("PHASE_2+").unwrap();
    c.loading = 9.0;
    first.set_block_content("PHASE_2+", c).unwrap();

    let mut second = factory.open(Path::new("a.pbm")).unwrap();
    second.load_model().unwrap();
    assert_eq!(second.block_content("PHASE_2+").unwrap().loading, 0.0);
}

#[test]
fn injected_fault_counts_across_sessions() {
    let factory = StubFactory::new(StubMachineSpec::default())
        .unwrap()
        .with_faults(FaultPlan::new().fail_on(StubOperation::Solve, 2));

    let mut a = factory.open(Path::new("a.pbm")).unwrap();
    a.load_model().unwrap();
    assert!(a.solve().is_ok());

    let mut b = factory.open(Path::new("a.pbm")).unwrap();
    b.load_model().unwrap();
    assert!(matches!(b.solve(), Err(FluxrigError::Automation(_))));
    assert!(b.solve().is_ok());
    assert_eq!(factory.calls(StubOperation::Solve), 3);
    assert_eq!(factory.journal().solves, 2);
}

#[test]
fn disconnect_kills_the_session() {
    let factory = StubFactory::new(StubMachineSpec::default())
        .unwrap()
        .with_faults(FaultPlan::new().disconnect_on(StubOperation::BlockContent, 1));
    let mut s = factory.open(Path::new("a.pbm")).unwrap();
    s.load_model().unwrap();
    assert!(matches!(
        s.block_content("PHASE_1+"),
        Err(FluxrigError::ConnectionLost(_))
    ));
    assert!(matches!(s.solve(), Err(FluxrigError::ConnectionLost(_))));
}

#[test]
fn block_content_json_shape() {
    let content = BlockContent {
        loading: 2.5,
        total_current: true,
        ..BlockContent::default()
    };
    let json: serde_json::Value = serde_json::to_value(content).unwrap();
    assert_eq!(json["loading"], 2.5);
    assert_eq!(json["coercive"]["magnitude"], 0.0);
    assert_eq!(json["polar"], false);
}
