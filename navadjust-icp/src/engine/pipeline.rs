//! Single-crossing alignment pipeline.
//!
//! ```text
//! swaths ─→ sample ─→ project ─→ drop invalid ─→ rough translation
//!                                                      │
//!   result ←─ fitness ←─ ICP ←─ outlier removal ←─ finite check
//! ```
//!
//! Both clouds share one local frame anchored at the source section's
//! central reference. The target stays fixed; the source is moved.

use std::time::{Duration, Instant};

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::algorithms::registration::{
    Correspondence, RegistrationConfig, RegistrationEngine, TerminationReason,
    fitness_correspondence,
};
use crate::core::transform::{RigidDecomposition, to_row_major};
use crate::core::types::{CloudSide, Crossing, CrossingKey, PointCloud};
use crate::error::{AlignError, Result};
use crate::geodesy::LocalFrameProjector;
use crate::io::project::CrossingData;
use crate::preprocessing::{
    CloudFilter, StatisticalOutlierConfig, StatisticalOutlierFilter, drop_invalid,
    reject_non_finite,
};
use crate::sensors::SwathSampler;

/// Fewest points either cloud needs for a rigid solve.
const MIN_CLOUD_POINTS: usize = 3;

// ============================================================================
// Configuration
// ============================================================================

/// Alignment parameters shared by every crossing in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// ICP iteration cap.
    ///
    /// Default: 100
    pub max_iterations: u32,

    /// Correspondence distance cutoff (meters), 0 disables.
    ///
    /// Default: 0.0
    pub max_correspondence_distance: f64,

    /// Fixed overlap fraction in (0, 1] for trimming.
    ///
    /// Takes precedence over the crossing's own overlap estimate.
    /// Default: None
    pub overlap_fraction: Option<f64>,

    /// Trim with the crossing's overlap percentage when no fixed fraction is set.
    ///
    /// Default: true
    pub use_crossing_overlap: bool,

    /// One correspondence per target point.
    ///
    /// Default: true
    pub one_to_one: bool,

    /// Incremental transform magnitude convergence threshold.
    ///
    /// Default: 1e-6
    pub transform_epsilon: f64,

    /// Fitness change convergence threshold (m²).
    ///
    /// Default: 1e-6
    pub fitness_epsilon: f64,

    /// Rough translation (x, y, z meters) for crossings without ties.
    ///
    /// Default: [0, 0, 0]
    pub initial_translation: [f64; 3],

    /// Outlier removal for the target cloud.
    pub target_outliers: StatisticalOutlierConfig,

    /// Outlier removal for the source cloud.
    pub source_outliers: StatisticalOutlierConfig,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_correspondence_distance: 0.0,
            overlap_fraction: None,
            use_crossing_overlap: true,
            one_to_one: true,
            transform_epsilon: 1e-6,
            fitness_epsilon: 1e-6,
            initial_translation: [0.0; 3],
            target_outliers: StatisticalOutlierConfig::default(),
            source_outliers: StatisticalOutlierConfig::default(),
        }
    }
}

impl AlignmentConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AlignError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.max_correspondence_distance.is_finite() {
            return Err(AlignError::Config(
                "max_correspondence_distance must be finite".to_string(),
            ));
        }
        if let Some(f) = self.overlap_fraction
            && !(f > 0.0 && f <= 1.0)
        {
            return Err(AlignError::Config(format!(
                "overlap_fraction {} outside (0, 1]",
                f
            )));
        }
        let non_negative = |v: f64| v >= 0.0;
        if !non_negative(self.transform_epsilon) || !non_negative(self.fitness_epsilon) {
            return Err(AlignError::Config(
                "convergence epsilons must be non-negative".to_string(),
            ));
        }
        if self.initial_translation.iter().any(|v| !v.is_finite()) {
            return Err(AlignError::Config(
                "initial_translation must be finite".to_string(),
            ));
        }
        for (side, outliers) in [
            (CloudSide::Target, &self.target_outliers),
            (CloudSide::Source, &self.source_outliers),
        ] {
            if outliers.enabled && outliers.neighbor_count == 0 {
                return Err(AlignError::Config(format!(
                    "{} outlier neighbor_count must be at least 1",
                    side
                )));
            }
            if !outliers.std_dev_multiplier.is_finite() {
                return Err(AlignError::Config(format!(
                    "{} outlier std_dev_multiplier must be finite",
                    side
                )));
            }
        }
        Ok(())
    }

    /// Overlap fraction used for trimming on `crossing`.
    ///
    /// The fixed fraction wins; otherwise the crossing's percentage clamped to
    /// (0, 1] when enabled. A crossing overlap of 0 disables trimming.
    pub fn effective_overlap(&self, crossing: &Crossing) -> Option<f64> {
        if self.overlap_fraction.is_some() {
            return self.overlap_fraction;
        }
        if self.use_crossing_overlap && crossing.overlap > 0 {
            return Some((crossing.overlap as f64 / 100.0).min(1.0));
        }
        None
    }

    /// Engine configuration with the given trimming fraction.
    pub fn registration_config(&self, overlap_fraction: Option<f64>) -> RegistrationConfig {
        RegistrationConfig {
            max_iterations: self.max_iterations,
            max_correspondence_distance: self.max_correspondence_distance,
            overlap_fraction,
            one_to_one: self.one_to_one,
            transform_epsilon: self.transform_epsilon,
            fitness_epsilon: self.fitness_epsilon,
            min_correspondences: MIN_CLOUD_POINTS,
        }
    }
}

/// Rough translation applied to the source before ICP.
///
/// Zero when ties are ignored, else the first tie's offset, else the
/// configured initial translation.
pub fn rough_translation(
    crossing: &Crossing,
    ignore_ties: bool,
    config: &AlignmentConfig,
) -> Vector3<f64> {
    if ignore_ties {
        return Vector3::zeros();
    }
    match crossing.ties.first() {
        Some(tie) => tie.offset(),
        None => Vector3::from(config.initial_translation),
    }
}

// ============================================================================
// Debug observation
// ============================================================================

/// Point cloud capture points within the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudStage {
    /// Projected and validity-filtered, source at its rough position
    Raw,
    /// After outlier removal, source at its rough position
    Filtered,
    /// Source at its registered position
    Final,
}

impl CloudStage {
    /// Lowercase stage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudStage::Raw => "raw",
            CloudStage::Filtered => "filtered",
            CloudStage::Final => "final",
        }
    }
}

/// Receives intermediate clouds from a pipeline run.
///
/// `correspondences` is non-empty only for the final source cloud; its
/// source indices refer to that cloud.
pub trait CloudObserver: Sync {
    /// Called once per stage and side.
    fn observe(
        &self,
        stage: CloudStage,
        side: CloudSide,
        cloud: &PointCloud,
        correspondences: &[Correspondence],
    );
}

// ============================================================================
// Result
// ============================================================================

/// Outcome of aligning one crossing.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// Crossing identity (target then source)
    pub crossing: CrossingKey,
    /// Crossing overlap estimate (percent)
    pub overlap: u32,
    /// Target points after filtering
    pub target_points: usize,
    /// Source points after filtering
    pub source_points: usize,
    /// Correspondences used by the last ICP solve
    pub correspondence_count: usize,
    /// Trimming fraction applied, if any
    pub overlap_used: Option<f64>,
    /// Fitness at the rough transform
    pub fitness_rough: f64,
    /// Fitness at the final transform
    pub fitness_fine: f64,
    /// Wall time for filtering, registration, and scoring
    pub elapsed: Duration,
    /// Final transform mapping source onto target
    pub transform: Matrix4<f64>,
    /// `transform` as translation plus Euler angles
    pub rigid: RigidDecomposition,
    /// ICP iterations performed
    pub iterations: u32,
    /// Why ICP stopped
    pub termination: Option<TerminationReason>,
    /// Source centroid before rough alignment
    pub source_centroid: Option<Point3<f64>>,
    /// Source centroid after rough alignment
    pub source_centroid_rough: Option<Point3<f64>>,
}

impl AlignmentResult {
    /// Elapsed time in whole milliseconds.
    pub fn milliseconds(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Transform entries T0..T15, row-major.
    pub fn transform_row_major(&self) -> [f64; 16] {
        to_row_major(&self.transform)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Aligns the two sections of a crossing.
#[derive(Debug, Clone)]
pub struct AlignmentPipeline {
    config: AlignmentConfig,
    ignore_ties: bool,
    sampler: SwathSampler,
    target_filter: StatisticalOutlierFilter,
    source_filter: StatisticalOutlierFilter,
}

impl AlignmentPipeline {
    /// Create a pipeline.
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            target_filter: StatisticalOutlierFilter::new(config.target_outliers),
            source_filter: StatisticalOutlierFilter::new(config.source_outliers),
            sampler: SwathSampler::new(),
            ignore_ties: false,
            config,
        }
    }

    /// Use a zero rough translation regardless of ties.
    pub fn with_ignore_ties(mut self, ignore_ties: bool) -> Self {
        self.ignore_ties = ignore_ties;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Sample, project and validity-filter both sections.
    ///
    /// Swaths whose beam arrays are not parallel are rejected before sampling.
    ///
    /// Consumes the crossing data; swath buffers are released on return.
    fn prepare_clouds(&self, data: CrossingData) -> Result<(PointCloud, PointCloud)> {
        let CrossingData { target, source } = data;
        for (side, section) in [(CloudSide::Target, &target), (CloudSide::Source, &source)] {
            section
                .swath
                .validate()
                .map_err(|reason| AlignError::MalformedSwath { side, reason })?;
        }
        if target.swath.is_empty() {
            return Err(AlignError::EmptySwath {
                side: CloudSide::Target,
            });
        }
        let reference = self
            .sampler
            .central_reference(&source.swath)
            .ok_or(AlignError::EmptySwath {
                side: CloudSide::Source,
            })?;

        let mut target_points = self.sampler.sample(&target.swath, reference.draft);
        let mut source_points = self.sampler.sample(&source.swath, reference.draft);

        let projector = LocalFrameProjector::new(reference.lat, reference.lon)?;
        projector.project_points(&mut target_points);
        projector.project_points(&mut source_points);

        let target_cloud = PointCloud::from_geometry(&drop_invalid(&target_points));
        let source_cloud = PointCloud::from_geometry(&drop_invalid(&source_points));
        log::debug!(
            "Sections {} / {}: {} / {} valid of {} / {} beams, reference ({:.6}, {:.6}) draft {:.2} m",
            target.info.file_id,
            source.info.file_id,
            target_cloud.len(),
            source_cloud.len(),
            target_points.len(),
            source_points.len(),
            reference.lat,
            reference.lon,
            reference.draft
        );
        Ok((target_cloud, source_cloud))
    }

    /// Align one crossing.
    ///
    /// Errors abort this crossing only. Non-finite coordinates in either
    /// cloud fail the crossing before registration runs.
    pub fn run(
        &self,
        crossing: &Crossing,
        data: CrossingData,
        observer: Option<&dyn CloudObserver>,
    ) -> Result<AlignmentResult> {
        let (target, source) = self.prepare_clouds(data)?;

        let rough = Matrix4::new_translation(&rough_translation(
            crossing,
            self.ignore_ties,
            &self.config,
        ));
        let source_centroid = source.centroid();
        let source_centroid_rough = source_centroid.map(|c| rough.transform_point(&c));

        reject_non_finite(&target, CloudSide::Target)?;
        reject_non_finite(&source, CloudSide::Source)?;

        if let Some(observer) = observer {
            observer.observe(CloudStage::Raw, CloudSide::Target, &target, &[]);
            observer.observe(CloudStage::Raw, CloudSide::Source, &source.transformed(&rough), &[]);
        }

        // Observer output is kept out of the reported time
        let mut elapsed = Duration::ZERO;
        let start = Instant::now();

        let target = self.target_filter.filter(&target);
        let source = self.source_filter.filter(&source);
        for (side, cloud) in [(CloudSide::Target, &target), (CloudSide::Source, &source)] {
            if cloud.len() < MIN_CLOUD_POINTS {
                return Err(AlignError::TooFewPoints {
                    side,
                    count: cloud.len(),
                    required: MIN_CLOUD_POINTS,
                });
            }
        }
        elapsed += start.elapsed();

        if let Some(observer) = observer {
            observer.observe(CloudStage::Filtered, CloudSide::Target, &target, &[]);
            observer.observe(
                CloudStage::Filtered,
                CloudSide::Source,
                &source.transformed(&rough),
                &[],
            );
        }

        let start = Instant::now();
        let overlap_used = self.config.effective_overlap(crossing);
        let engine = RegistrationEngine::new(self.config.registration_config(overlap_used));
        let registration = engine.align(&source, &target, &rough);

        // Running out of correspondences still yields a row, scored with the
        // sentinel, at the last accepted transform
        let exhausted =
            registration.termination == Some(TerminationReason::CorrespondencesExhausted);
        if !registration.is_success() && !exhausted {
            return Err(AlignError::Registration(format!(
                "{} correspondences after {} iterations",
                registration.correspondences.len(),
                registration.iterations
            )));
        }
        let correspondences: &[Correspondence] = if exhausted {
            &[]
        } else {
            &registration.correspondences
        };

        let fitness_rough = fitness_correspondence(&source, &target, correspondences, &rough);
        let fitness_fine =
            fitness_correspondence(&source, &target, correspondences, &registration.transform);
        elapsed += start.elapsed();

        if exhausted {
            log::warn!(
                "Crossing {}: {} correspondences left after {} iterations, reporting sentinel fitness",
                crossing.key(),
                registration.correspondences.len(),
                registration.iterations
            );
        }

        if let Some(observer) = observer {
            observer.observe(CloudStage::Final, CloudSide::Target, &target, &[]);
            observer.observe(
                CloudStage::Final,
                CloudSide::Source,
                &source.transformed(&registration.transform),
                correspondences,
            );
        }

        log::debug!(
            "Crossing {}: {} iterations ({}), fitness {:.4} -> {:.4}",
            crossing.key(),
            registration.iterations,
            registration
                .termination
                .map(|t| t.to_string())
                .unwrap_or_default(),
            fitness_rough,
            fitness_fine
        );

        Ok(AlignmentResult {
            crossing: crossing.key(),
            overlap: crossing.overlap,
            target_points: target.len(),
            source_points: source.len(),
            correspondence_count: correspondences.len(),
            overlap_used,
            fitness_rough,
            fitness_fine,
            elapsed,
            rigid: RigidDecomposition::from_matrix(&registration.transform),
            transform: registration.transform,
            iterations: registration.iterations,
            termination: registration.termination,
            source_centroid,
            source_centroid_rough,
        })
    }
}
