//! Point-to-point ICP engine.
//!
//! # Algorithm
//!
//! ```text
//! Input: source S, target T, initial guess T₀
//! Output: transform T* mapping S onto T
//!
//! 1. Build a k-d tree over T, S' = T₀ · S
//! 2. For each iteration:
//!    a. Nearest neighbour in T for every point of S'
//!    b. Run the rejector chain
//!    c. Solve ΔT (Kabsch) on the survivors
//!    d. S' = ΔT · S', T* = ΔT · T*
//!    e. Stop if |ΔT| < ε_t or |mse − mse_prev| < ε_f
//! 3. Return T*
//! ```

use nalgebra::{Matrix4, Point3};

use super::rejection::{CorrespondenceRejector, default_rejectors};
use super::solver::solve_rigid;
use super::{
    Correspondence, RegistrationConfig, RegistrationResult, RegistrationState, TerminationReason,
};
use crate::core::spatial::NeighborIndex;
use crate::core::transform::delta_magnitude;
use crate::core::types::PointCloud;

/// ICP registration engine.
///
/// Holds the configuration and the rejector chain; stateless between runs.
pub struct RegistrationEngine {
    config: RegistrationConfig,
    rejectors: Vec<Box<dyn CorrespondenceRejector>>,
}

impl RegistrationEngine {
    /// Engine with the default rejector chain for `config`.
    pub fn new(config: RegistrationConfig) -> Self {
        let rejectors = default_rejectors(&config);
        Self { config, rejectors }
    }

    /// Engine with an explicit rejector chain, applied in the given order.
    pub fn with_rejectors(
        config: RegistrationConfig,
        rejectors: Vec<Box<dyn CorrespondenceRejector>>,
    ) -> Self {
        Self { config, rejectors }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Names of the active rejectors, in order.
    pub fn rejector_names(&self) -> Vec<&'static str> {
        self.rejectors.iter().map(|r| r.name()).collect()
    }

    fn search(&self, moved: &PointCloud, index: &NeighborIndex) -> Vec<Correspondence> {
        moved
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let hit = index.nearest(p);
                Correspondence::new(i, hit.index, hit.distance_sq)
            })
            .collect()
    }

    fn reject(&self, mut correspondences: Vec<Correspondence>) -> Vec<Correspondence> {
        for rejector in &self.rejectors {
            let before = correspondences.len();
            correspondences = rejector.reject(correspondences);
            log::trace!(
                "{}: {} -> {} correspondences",
                rejector.name(),
                before,
                correspondences.len()
            );
        }
        correspondences
    }

    /// Align `source` onto `target` starting from `initial_guess`.
    ///
    /// `source` is in its own frame; the returned transform includes the
    /// initial guess. Empty or tiny inputs yield a `Failed` result carrying
    /// the initial guess.
    pub fn align(
        &self,
        source: &PointCloud,
        target: &PointCloud,
        initial_guess: &Matrix4<f64>,
    ) -> RegistrationResult {
        let mut state = RegistrationState::Init;
        log::trace!(
            "ICP {:?}: {} source, {} target points",
            state,
            source.len(),
            target.len()
        );

        if source.len() < self.config.min_correspondences {
            return RegistrationResult::failed(*initial_guess, 0);
        }
        let Some(index) = NeighborIndex::build(target) else {
            return RegistrationResult::failed(*initial_guess, 0);
        };

        let mut moved = source.transformed(initial_guess);
        let mut current = *initial_guess;
        let mut last_mse: Option<f64> = None;
        let mut correspondences = Vec::new();
        let mut mse = f64::MAX;
        let mut iterations = 0u32;
        let mut termination = None;

        for iter in 0..self.config.max_iterations {
            iterations = iter + 1;

            state = RegistrationState::Searching;
            let found = self.search(&moved, &index);
            log::trace!(
                "ICP iteration {} {:?}: {} correspondences",
                iterations,
                state,
                found.len()
            );

            state = RegistrationState::Rejecting;
            let kept = self.reject(found);
            if kept.len() < self.config.min_correspondences {
                log::debug!(
                    "ICP failed at iteration {} while {:?}: {} correspondences survive",
                    iterations,
                    state,
                    kept.len()
                );
                return RegistrationResult {
                    correspondences: kept,
                    termination: Some(TerminationReason::CorrespondencesExhausted),
                    ..RegistrationResult::failed(current, iterations)
                };
            }

            state = RegistrationState::Solving;
            let src: Vec<Point3<f64>> = kept.iter().map(|c| moved.point_at(c.source_index)).collect();
            let dst: Vec<Point3<f64>> = kept.iter().map(|c| target.point_at(c.target_index)).collect();
            let Some(delta) = solve_rigid(&src, &dst) else {
                log::debug!(
                    "ICP failed at iteration {} while {:?}: degenerate solve",
                    iterations,
                    state
                );
                return RegistrationResult {
                    correspondences: kept,
                    ..RegistrationResult::failed(current, iterations)
                };
            };

            moved.transform_in_place(&delta);
            current = delta * current;
            mse = src
                .iter()
                .zip(dst.iter())
                .map(|(s, d)| (delta.transform_point(s) - d).norm_squared())
                .sum::<f64>()
                / kept.len() as f64;
            correspondences = kept;

            if delta_magnitude(&delta) < self.config.transform_epsilon {
                termination = Some(TerminationReason::TransformConverged);
                break;
            }
            if let Some(prev) = last_mse
                && (prev - mse).abs() < self.config.fitness_epsilon
            {
                termination = Some(TerminationReason::FitnessConverged);
                break;
            }
            last_mse = Some(mse);
        }

        state = match termination {
            Some(_) => RegistrationState::Converged,
            None if iterations == 0 => RegistrationState::Failed,
            None => {
                termination = Some(TerminationReason::MaxIterations);
                RegistrationState::MaxIterReached
            }
        };
        log::trace!(
            "ICP {:?} after {} iterations, mse {:.6}",
            state,
            iterations,
            mse
        );

        RegistrationResult {
            transform: current,
            correspondences,
            state,
            termination,
            iterations,
            mse,
        }
    }
}

/// Mean squared distance between `transform · source[i]` and `target[j]` over
/// the given correspondences.
///
/// Returns `f64::MAX` when there are no correspondences.
pub fn fitness_correspondence(
    source: &PointCloud,
    target: &PointCloud,
    correspondences: &[Correspondence],
    transform: &Matrix4<f64>,
) -> f64 {
    if correspondences.is_empty() {
        return f64::MAX;
    }
    let sum: f64 = correspondences
        .iter()
        .map(|c| {
            let s = transform.transform_point(&source.point_at(c.source_index));
            (s - target.point_at(c.target_index)).norm_squared()
        })
        .sum();
    sum / correspondences.len() as f64
}

/// Mean squared nearest-neighbour distance over every transformed source point.
///
/// Each squared distance is clamped at `max_range²`, so unmatched geometry
/// counts as a full miss rather than being ignored. Returns `f64::MAX` when
/// either cloud is empty.
pub fn fitness_global(
    source: &PointCloud,
    target: &PointCloud,
    transform: &Matrix4<f64>,
    max_range: f64,
) -> f64 {
    if source.is_empty() {
        return f64::MAX;
    }
    let Some(index) = NeighborIndex::build(target) else {
        return f64::MAX;
    };
    let cap = max_range * max_range;
    let sum: f64 = source
        .iter()
        .map(|p| index.nearest(&transform.transform_point(p)).distance_sq.min(cap))
        .sum();
    sum / source.len() as f64
}
