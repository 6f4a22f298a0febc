//! The orchestrator — session ownership and fault recovery.
//!
//! Every public operation runs inside [`Orchestrator::guarded`]:
//!
//! ```text
//! for attempt in 1..=max_attempts {
//!     ensure a live session (reopen + reload + remesh + replay + re-solve if needed)
//!     run the whole operation
//!     ok                 → return
//!     not recoverable    → return the error
//!     recoverable        → log, discard the session, back off
//! }
//! return RetriesExhausted
//! ```
//!
//! A failed session is never repaired; it is dropped and a fresh one is
//! opened on the same problem. Operations restart from their first step.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use fluxrig_session::{SessionFactory, SolverSession};
use fluxrig_telemetry::{EventBus, EventKind};
use fluxrig_types::{FluxrigError, FluxrigResult, PhaseId};

use crate::config::OrchestratorConfig;
use crate::setup::{SetupAction, SetupLog};
use crate::{excitation, magnets, measure, rotor};

fn no_session() -> FluxrigError {
    FluxrigError::ConnectionLost("no live solver session".into())
}

/// Drives one solver session through excitation experiments.
pub struct Orchestrator {
    factory: Box<dyn SessionFactory>,
    config: OrchestratorConfig,
    bus: EventBus,
    problem: Option<PathBuf>,
    session: Option<Box<dyn SolverSession>>,
    /// The live session holds analyzed results of a solve.
    results_ready: bool,
    /// The next opened session replaces a failed one.
    rebuild_on_open: bool,
    /// The current geometry has been solved; a rebuilt session solves
    /// again after the setup replay so results stay available.
    resolve_on_rebuild: bool,
    resets: u32,
    setup: SetupLog,
}

impl Orchestrator {
    /// Creates an orchestrator. No engine is started until [`load`](Self::load).
    pub fn new(factory: Box<dyn SessionFactory>, config: OrchestratorConfig) -> FluxrigResult<Self> {
        config.validate()?;
        Ok(Self {
            factory,
            config,
            bus: EventBus::new(),
            problem: None,
            session: None,
            results_ready: false,
            rebuild_on_open: false,
            resolve_on_rebuild: false,
            resets: 0,
            setup: SetupLog::new(),
        })
    }

    /// Replace the event bus (to attach sinks).
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Problem of the last [`load`](Self::load).
    pub fn problem(&self) -> Option<&Path> {
        self.problem.as_deref()
    }

    /// Number of sessions rebuilt after failures since creation.
    pub fn session_resets(&self) -> u32 {
        self.resets
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Setup that would be replayed onto a rebuilt session.
    pub fn setup(&self) -> &[SetupAction] {
        self.setup.actions()
    }

    // ─── Public operations ───────────────────────────────────────

    /// Open `problem` in a new session and load its model.
    ///
    /// Any previous session and recorded setup are dropped.
    pub fn load(&mut self, problem: impl AsRef<Path>) -> FluxrigResult<()> {
        let problem = problem.as_ref().to_path_buf();
        self.bus.record(EventKind::Separator);
        self.session = None;
        self.results_ready = false;
        self.rebuild_on_open = false;
        self.resolve_on_rebuild = false;
        self.setup.clear();
        let detail = problem.display().to_string();
        self.problem = Some(problem);
        self.guarded("load", detail, |_| Ok(()))
    }

    /// Solve the problem and open its results.
    pub fn solve(&mut self) -> FluxrigResult<()> {
        self.guarded("solve", String::new(), |o| o.solve_and_analyze())
    }

    /// Drive `phase` (1-based) with `current`, `+` side positive.
    pub fn set_phase_current(
        &mut self,
        phase: u32,
        current: f64,
        total_current: bool,
    ) -> FluxrigResult<()> {
        let detail = format!("phase={phase}, current={current}, total={total_current}");
        let phase = PhaseId::new(phase)?;
        self.guarded("set_phase_current", detail, move |o| {
            let (session, config) = o.parts()?;
            excitation::apply_phase_current(
                session,
                &config.labels,
                phase,
                current,
                total_current,
                config.current_decimals,
            )
        })?;
        self.setup.record(SetupAction::PhaseCurrent {
            phase,
            current,
            total_current,
        });
        Ok(())
    }

    /// Enable every magnet at coercive field `magnitude`, or disable all.
    ///
    /// Returns the number of magnets found.
    pub fn set_magnets(&mut self, enabled: bool, magnitude: f64) -> FluxrigResult<usize> {
        let detail = format!("enabled={enabled}, coercive={magnitude}");
        if enabled && !(magnitude.is_finite() && magnitude >= 0.0) {
            return Err(FluxrigError::PreconditionViolated(format!(
                "coercive field must be finite and non-negative, got {magnitude}"
            )));
        }
        let count = self.guarded("set_magnets", detail, move |o| {
            let (session, config) = o.parts()?;
            magnets::set_magnets(
                session,
                &config.labels,
                config.magnet_probe_limit,
                enabled,
                magnitude,
            )
        })?;
        self.setup.record(SetupAction::Magnets { enabled, magnitude });
        Ok(count)
    }

    /// Flux linkage of `phase` (1-based) from the last solve.
    pub fn flux_linkage(&mut self, phase: u32) -> FluxrigResult<f64> {
        let detail = format!("phase={phase}");
        let phase = PhaseId::new(phase)?;
        let psi = self.guarded("flux_linkage", detail, move |o| o.flux_linkage_of(phase))?;
        self.bus.record(EventKind::Measurement {
            quantity: format!("flux_linkage[{phase}]"),
            value: psi,
        });
        self.bus.flush();
        Ok(psi)
    }

    /// Solve, then measure the torque on the airgap contour.
    pub fn torque(&mut self) -> FluxrigResult<f64> {
        let torque = self.guarded("torque", String::new(), |o| o.measure_torque())?;
        self.bus.record(EventKind::Measurement {
            quantity: "torque".into(),
            value: torque,
        });
        self.bus.flush();
        Ok(torque)
    }

    /// Turn the rotor to the absolute angle `angle` (radians).
    pub fn rotate_rotor(&mut self, angle: f64) -> FluxrigResult<()> {
        self.guarded("rotate_rotor", format!("angle={angle}"), move |o| {
            o.rotate_now(angle).map(|_| ())
        })?;
        self.setup.record(SetupAction::Rotor { angle });
        Ok(())
    }

    // ─── Building blocks for composite operations ────────────────

    /// Run `op` with session recovery.
    ///
    /// `op` must be safe to run again from the start on a fresh session.
    pub(crate) fn guarded<T, F>(
        &mut self,
        operation: &'static str,
        detail: String,
        mut op: F,
    ) -> FluxrigResult<T>
    where
        F: FnMut(&mut Self) -> FluxrigResult<T>,
    {
        self.bus.record(EventKind::CallBegin {
            operation: operation.to_string(),
            detail,
        });

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            let outcome = match self.ensure_session() {
                Ok(()) => op(self),
                Err(e) => Err(e),
            };
            let err = match outcome {
                Ok(value) => break Ok(value),
                Err(err) => err,
            };

            let recoverable = err.is_recoverable();
            self.bus.record(EventKind::Failure {
                operation: operation.to_string(),
                attempt,
                message: err.to_string(),
                recoverable,
            });
            // Write the failure out before a possibly long backoff.
            self.bus.flush();

            if !recoverable {
                break Err(err);
            }
            self.discard_session();
            if self.config.retry.is_exhausted(attempt) {
                self.bus.record(EventKind::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                });
                break Err(FluxrigError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            let delay = self.config.retry.backoff.delay(attempt);
            if !delay.is_zero() {
                tracing::debug!(operation, attempt, ?delay, "backing off before retry");
                thread::sleep(delay);
            }
        };

        self.bus.flush();
        result
    }

    /// The live session together with the configuration.
    pub(crate) fn parts(&mut self) -> FluxrigResult<(&mut dyn SolverSession, &OrchestratorConfig)> {
        let session = self.session.as_deref_mut().ok_or_else(no_session)?;
        Ok((session, &self.config))
    }

    /// Solve and analyze, under the configured timeout if any.
    pub(crate) fn solve_and_analyze(&mut self) -> FluxrigResult<()> {
        self.results_ready = false;
        match self.config.solve_timeout() {
            None => {
                let session = self.session.as_deref_mut().ok_or_else(no_session)?;
                session.solve()?;
                session.analyze_results()?;
            }
            Some(limit) => {
                let mut session = self.session.take().ok_or_else(no_session)?;
                let (tx, rx) = mpsc::channel();
                thread::Builder::new()
                    .name("fluxrig-solve".into())
                    .spawn(move || {
                        let outcome = session.solve().and_then(|()| session.analyze_results());
                        // The receiver is gone if the solve timed out.
                        let _ = tx.send((session, outcome));
                    })?;
                match rx.recv_timeout(limit) {
                    Ok((session, outcome)) => {
                        self.session = Some(session);
                        outcome?;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        tracing::warn!(?limit, "solve timed out; abandoning session");
                        return Err(FluxrigError::SolveTimeout {
                            seconds: limit.as_secs_f64(),
                        });
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(FluxrigError::ConnectionLost(
                            "solve worker ended without reporting".into(),
                        ));
                    }
                }
            }
        }
        self.results_ready = true;
        self.resolve_on_rebuild = true;
        Ok(())
    }

    pub(crate) fn flux_linkage_of(&mut self, phase: PhaseId) -> FluxrigResult<f64> {
        if !self.results_ready {
            return Err(FluxrigError::PreconditionViolated(
                "flux linkage requested before the problem was solved".into(),
            ));
        }
        let (session, config) = self.parts()?;
        measure::flux_linkage(session, &config.labels, phase)
    }

    pub(crate) fn measure_torque(&mut self) -> FluxrigResult<f64> {
        self.solve_and_analyze()?;
        let (session, config) = self.parts()?;
        measure::airgap_torque(session, &config.labels)
    }

    pub(crate) fn rotate_now(&mut self, angle: f64) -> FluxrigResult<f64> {
        self.results_ready = false;
        self.resolve_on_rebuild = false;
        let (session, config) = self.parts()?;
        rotor::rotate_to(session, config, angle)
    }

    pub(crate) fn record_setup(&mut self, action: SetupAction) {
        self.setup.record(action);
    }

    // ─── Session lifecycle ───────────────────────────────────────

    fn ensure_session(&mut self) -> FluxrigResult<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let problem = self.problem.clone().ok_or_else(|| {
            FluxrigError::PreconditionViolated("no problem loaded; call load first".into())
        })?;

        let mut session = self.factory.open(&problem)?;
        session.load_model()?;
        let rebuilt = self.rebuild_on_open;
        if rebuilt {
            session.build_mesh()?;
        }
        session.arrange_windows()?;
        if rebuilt && self.config.replay_setup {
            self.setup.replay(session.as_mut(), &self.config)?;
        }

        self.session = Some(session);
        self.results_ready = false;
        if rebuilt {
            self.resets += 1;
            self.rebuild_on_open = false;
        }
        self.bus.record(EventKind::SessionOpened {
            problem: problem.display().to_string(),
            rebuilt,
        });
        tracing::debug!(problem = %problem.display(), rebuilt, "session opened");

        if rebuilt && self.config.replay_setup && self.resolve_on_rebuild {
            tracing::debug!("re-solving rebuilt session");
            self.solve_and_analyze()?;
        }
        Ok(())
    }

    fn discard_session(&mut self) {
        self.session = None;
        self.results_ready = false;
        self.rebuild_on_open = true;
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.bus.shutdown();
    }
}
