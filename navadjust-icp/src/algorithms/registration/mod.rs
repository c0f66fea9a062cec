//! Rigid point cloud registration (Phase 3).
//!
//! Aligns a source bathymetry cloud onto a target cloud with point-to-point
//! ICP. Correspondence rejection is composed from independent strategies
//! applied in a fixed order rather than baked into the search.
//!
//! # Example
//!
//! ```ignore
//! use navadjust_icp::algorithms::registration::{RegistrationConfig, RegistrationEngine};
//! use navadjust_icp::core::transform::translation;
//!
//! let engine = RegistrationEngine::new(RegistrationConfig::default());
//! let result = engine.align(&source, &target, &translation(12.0, -3.5, 0.4));
//! if result.state.is_converged() {
//!     println!("Transform: {}", result.transform);
//! }
//! ```

mod engine;
mod rejection;
mod solver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use engine::{RegistrationEngine, fitness_correspondence, fitness_global};
pub use rejection::{
    CorrespondenceRejector, DistanceRejector, OneToOneRejector, OverlapTrimRejector,
    default_rejectors,
};
pub use solver::solve_rigid;

use std::fmt;

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// One source point paired with its nearest target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// Index into the source cloud
    pub source_index: usize,
    /// Index into the target cloud
    pub target_index: usize,
    /// Squared Euclidean distance at search time
    pub distance_sq: f64,
}

impl Correspondence {
    /// Create a correspondence.
    pub fn new(source_index: usize, target_index: usize, distance_sq: f64) -> Self {
        Self {
            source_index,
            target_index,
            distance_sq,
        }
    }

    /// Euclidean distance at search time.
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

/// Configuration for the registration engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationConfig {
    /// Maximum number of iterations.
    pub max_iterations: u32,

    /// Maximum correspondence distance (meters).
    ///
    /// Pairs farther apart are rejected. Zero or negative disables the cutoff.
    pub max_correspondence_distance: f64,

    /// Expected overlap fraction in (0, 1].
    ///
    /// Only the closest `floor(N * f)` correspondences are kept. `None` disables trimming.
    pub overlap_fraction: Option<f64>,

    /// Keep at most one correspondence per target point.
    pub one_to_one: bool,

    /// Stop when the incremental transform magnitude (‖Δt‖ + |Δθ|) drops below this.
    pub transform_epsilon: f64,

    /// Stop when the mean squared correspondence distance changes by less than this.
    pub fitness_epsilon: f64,

    /// Fewest surviving correspondences the solver accepts.
    pub min_correspondences: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_correspondence_distance: 0.0,
            overlap_fraction: None,
            one_to_one: true,
            transform_epsilon: 1e-6,
            fitness_epsilon: 1e-6,
            min_correspondences: 3,
        }
    }
}

/// Engine state machine.
///
/// ```text
/// Init → Searching → Rejecting → Solving ─┬→ Converged
///           ↑                              ├→ MaxIterReached
///           └──────────────────────────────┤
///                                          └→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Clouds received, index not built yet
    Init,
    /// Nearest neighbour search
    Searching,
    /// Applying rejection strategies
    Rejecting,
    /// Least-squares rigid solve
    Solving,
    /// A convergence test passed
    Converged,
    /// Iteration cap reached before convergence
    MaxIterReached,
    /// Not enough data to continue
    Failed,
}

impl RegistrationState {
    /// True for the three terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RegistrationState::Converged
                | RegistrationState::MaxIterReached
                | RegistrationState::Failed
        )
    }

    /// True when a convergence test passed.
    pub fn is_converged(&self) -> bool {
        *self == RegistrationState::Converged
    }
}

/// Why a run stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Incremental transform below `transform_epsilon`
    TransformConverged,
    /// Fitness change below `fitness_epsilon`
    FitnessConverged,
    /// `max_iterations` exhausted
    MaxIterations,
    /// Fewer than `min_correspondences` survived rejection (run `Failed`)
    CorrespondencesExhausted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::TransformConverged => "transform converged",
            TerminationReason::FitnessConverged => "fitness converged",
            TerminationReason::MaxIterations => "max iterations",
            TerminationReason::CorrespondencesExhausted => "correspondences exhausted",
        };
        f.write_str(s)
    }
}

/// Outcome of one registration run.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    /// Accumulated transform mapping the raw source cloud onto the target,
    /// initial guess included.
    pub transform: Matrix4<f64>,

    /// Correspondences used by the last solve.
    pub correspondences: Vec<Correspondence>,

    /// Terminal state.
    pub state: RegistrationState,

    /// Set for `Converged` and `MaxIterReached`, and for a `Failed` run that
    /// ran out of correspondences.
    pub termination: Option<TerminationReason>,

    /// Number of iterations performed.
    pub iterations: u32,

    /// Mean squared error of the last correspondences after the last solve.
    pub mse: f64,
}

impl RegistrationResult {
    /// Failed run that leaves the initial guess in place.
    pub fn failed(initial_guess: Matrix4<f64>, iterations: u32) -> Self {
        Self {
            transform: initial_guess,
            correspondences: Vec::new(),
            state: RegistrationState::Failed,
            termination: None,
            iterations,
            mse: f64::MAX,
        }
    }

    /// True unless the run failed.
    pub fn is_success(&self) -> bool {
        self.state != RegistrationState::Failed
    }
}
