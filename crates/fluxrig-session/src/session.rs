//! Solver session trait — the seam between orchestration and the engine.
//!
//! A session wraps one engine process with one opened problem. The
//! orchestrator drives it in this order:
//!
//! ```text
//! let mut s = factory.open(path)?;
//! s.load_model()?;
//! s.build_mesh()?;            // after a reset or a geometry change
//! s.arrange_windows()?;
//! loop {
//!     s.set_block_content(..)?;
//!     s.solve()?;
//!     s.analyze_results()?;
//!     s.clear_contour()?;
//!     s.contour_add_block(..)?;
//!     s.integral(..)?;
//! }
//! ```
//!
//! Any error leaves the session in an unknown state; the caller drops it
//! and opens a new one rather than trying to repair it.

use std::path::Path;

use fluxrig_types::FluxrigResult;

use crate::content::BlockContent;
use crate::integral::{IntegralKind, IntegralValue};

/// One live connection to an external field solver.
///
/// Lookups of labels that do not exist must fail with
/// [`FluxrigError::LabelNotFound`](fluxrig_types::FluxrigError::LabelNotFound);
/// the orchestrator relies on that error to end magnet discovery.
pub trait SolverSession: Send {
    /// Load the model (geometry, mesh, labels) of the opened problem.
    fn load_model(&mut self) -> FluxrigResult<()>;

    /// Rebuild the mesh of all blocks.
    fn build_mesh(&mut self) -> FluxrigResult<()>;

    /// Minimize the main window and maximize the document window.
    ///
    /// Purely cosmetic. Headless engines keep the default.
    fn arrange_windows(&mut self) -> FluxrigResult<()> {
        Ok(())
    }

    /// Fetch a copy of a block label's content.
    fn block_content(&mut self, label: &str) -> FluxrigResult<BlockContent>;

    /// Replace a block label's content with `content`.
    fn set_block_content(&mut self, label: &str, content: BlockContent) -> FluxrigResult<()>;

    /// All block label names, when the engine can enumerate them.
    ///
    /// `None` means the caller has to probe names one by one.
    fn block_labels(&mut self) -> FluxrigResult<Option<Vec<String>>> {
        Ok(None)
    }

    /// Solve the problem in the foreground.
    fn solve(&mut self) -> FluxrigResult<()>;

    /// Open the results of the last solve for post-processing.
    fn analyze_results(&mut self) -> FluxrigResult<()>;

    /// Delete the integration contour of the result view.
    fn clear_contour(&mut self) -> FluxrigResult<()>;

    /// Add a block region to the integration contour.
    fn contour_add_block(&mut self, label: &str) -> FluxrigResult<()>;

    /// Add a labeled edge to the integration contour.
    fn contour_add_edge(&mut self, label: &str) -> FluxrigResult<()>;

    /// Evaluate a field integral over the current contour.
    fn integral(&mut self, kind: IntegralKind) -> FluxrigResult<IntegralValue>;

    /// Polar angle (radians) of the first vertex carrying `label`.
    fn labeled_vertex_angle(&mut self, label: &str) -> FluxrigResult<f64>;

    /// Radius of the first arc edge carrying `label`.
    fn labeled_edge_radius(&mut self, label: &str) -> FluxrigResult<f64>;

    /// Select all geometry inside the circle of `radius` around the
    /// origin and rotate it by `angle` radians.
    fn rotate_within(&mut self, radius: f64, angle: f64) -> FluxrigResult<()>;

    /// Returns the engine's name.
    fn name(&self) -> &str;
}

/// Opens sessions against a problem file.
pub trait SessionFactory: Send + Sync {
    /// Start an engine and open the problem at `problem`.
    fn open(&self, problem: &Path) -> FluxrigResult<Box<dyn SolverSession>>;

    /// Returns the factory's name.
    fn name(&self) -> &str;
}
