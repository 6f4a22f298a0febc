//! CLI command implementations.

use std::path::Path;

use fluxrig_core::Orchestrator;
use fluxrig_io::{run_plan, validate_plan, ExperimentPlan, MachineReport};
use fluxrig_session::{StubFactory, StubMachineSpec};
use fluxrig_telemetry::{EventBus, LogFileSink, TracingSink};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn read_plan(path: &Path) -> Result<ExperimentPlan, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let plan: ExperimentPlan = toml::from_str(&content)?;
    Ok(plan)
}

fn read_fixture(path: &Path) -> Result<StubMachineSpec, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let spec: StubMachineSpec = toml::from_str(&content)?;
    Ok(spec)
}

/// Run a plan against the reference machine.
pub fn run(
    plan_path: &Path,
    fixture_path: &Path,
    log_path: &Path,
    output: Option<&Path>,
    verbose: bool,
) -> CmdResult {
    println!("fluxrig run");
    println!("───────────");
    println!("Plan:    {}", plan_path.display());
    println!("Fixture: {}", fixture_path.display());
    println!("Log:     {}", log_path.display());
    println!();

    let plan = read_plan(plan_path)?;
    let spec = read_fixture(fixture_path)?;
    if spec.phase_count() != plan.phase_count {
        return Err(format!(
            "Plan has {} phases but the fixture models {}",
            plan.phase_count,
            spec.phase_count()
        )
        .into());
    }

    let factory = StubFactory::new(spec)?;
    let mut bus = EventBus::new().with_sink(Box::new(LogFileSink::open(log_path)?));
    if verbose {
        bus.add_sink(Box::new(TracingSink::new()));
    }

    let report = {
        let mut orch = Orchestrator::new(Box::new(factory), plan.orchestrator.clone())?.with_bus(bus);
        run_plan(&mut orch, &plan)?
    };

    print_summary(&report);

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("Report written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary(report: &MachineReport) {
    println!("Inductance matrix (H):");
    for row in report.inductance.rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>11.4e}")).collect();
        println!("  {}", cells.join(" "));
    }
    if !report.torque.is_empty() {
        println!();
        println!("Torque:");
        for s in &report.torque {
            println!("  θ = {:>8.4} rad   T = {:.6e} N·m", s.angle, s.torque);
        }
    }
    println!();
    println!("Session resets: {}", report.session_resets);
    println!();
}

/// Validate a plan or a fixture.
pub fn validate(path: &Path, fixture: bool) -> CmdResult {
    println!("fluxrig validator");
    println!("─────────────────");
    println!();

    if fixture {
        println!("Validating fixture: {}", path.display());
        let spec = read_fixture(path)?;
        match spec.validate() {
            Ok(()) => println!(
                "✅ Fixture is valid ({} phases, {} magnets).",
                spec.phase_count(),
                spec.magnet_count
            ),
            Err(e) => println!("❌ Fixture validation failed: {e}"),
        }
    } else {
        println!("Validating plan: {}", path.display());
        let plan = read_plan(path)?;
        match validate_plan(&plan) {
            Ok(()) => println!(
                "✅ Plan is valid ({} phases, {} rotor angles).",
                plan.phase_count,
                plan.rotor_angles.len()
            ),
            Err(e) => println!("❌ Plan validation failed: {e}"),
        }
    }

    Ok(())
}
