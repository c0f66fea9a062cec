//! Crossing selection and parallel execution.
//!
//! # Threading model
//!
//! ```text
//! eligible crossings ─→ partition ─→ [chunk 0] [chunk 1] ... [chunk k-1]
//!                                        │         │             │
//!                                    align-0   align-1  ...  align-k-1   (k ≤ 8)
//!                                        │         │             │
//!                                        └──── ResultLog (one write per line)
//! ```
//!
//! Each worker owns one contiguous chunk and processes it in order. Workers
//! share only the read-only project and the result log.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::pipeline::{AlignmentConfig, AlignmentPipeline, AlignmentResult, CloudObserver};
use crate::core::types::{Crossing, CrossingKey};
use crate::error::{AlignError, Result};
use crate::io::project::ProjectStore;
use crate::io::result_log::ResultLog;

/// Hard cap on worker threads.
pub const MAX_WORKERS: usize = 8;

// ============================================================================
// Configuration
// ============================================================================

/// Which crossings to run and how many workers to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Crossings must overlap strictly more than this (percent).
    ///
    /// Default: 0
    pub min_overlap: u32,

    /// Also run crossings without ties.
    ///
    /// Default: false
    pub include_untied: bool,

    /// Start every crossing from a zero rough translation.
    ///
    /// Default: false
    pub ignore_ties: bool,

    /// Requested worker threads, capped at [`MAX_WORKERS`].
    ///
    /// Default: 4
    pub workers: usize,

    /// Run only this crossing (`"f1:s1/f2:s2"`).
    ///
    /// Default: None
    pub crossing: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_overlap: 0,
            include_untied: false,
            ignore_ties: false,
            workers: 4,
            crossing: None,
        }
    }
}

impl SchedulerConfig {
    /// Worker count actually used, in `1..=MAX_WORKERS`.
    pub fn effective_workers(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }

    /// Parsed single-crossing selector.
    pub fn crossing_key(&self) -> Result<Option<CrossingKey>> {
        self.crossing
            .as_deref()
            .map(|s| {
                s.parse::<CrossingKey>()
                    .map_err(|e| AlignError::Config(format!("crossing selector: {}", e)))
            })
            .transpose()
    }
}

// ============================================================================
// Selection and partitioning
// ============================================================================

/// Crossings with `(ties > 0 || include_untied) && overlap > min_overlap`, in project order.
pub fn select_eligible(
    crossings: &[Crossing],
    min_overlap: u32,
    include_untied: bool,
) -> Vec<&Crossing> {
    crossings
        .iter()
        .filter(|c| (c.tie_count() > 0 || include_untied) && c.overlap > min_overlap)
        .collect()
}

/// Split `items` into at most `workers` contiguous, near-equal chunks.
///
/// With `len % k = r`, the first `r` chunks hold one extra item. Empty input
/// gives no chunks; a worker count of zero is treated as one.
pub fn partition<T>(items: &[T], workers: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    let k = workers.max(1).min(items.len());
    let base = items.len() / k;
    let extra = items.len() % k;

    let mut chunks = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = base + usize::from(i < extra);
        chunks.push(&items[start..start + size]);
        start += size;
    }
    chunks
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of attempting one crossing.
#[derive(Debug)]
pub enum CrossingOutcome {
    /// Registration completed
    Aligned(AlignmentResult),
    /// Crossing aborted; siblings continue
    Failed {
        /// Crossing identity
        crossing: CrossingKey,
        /// Reason
        error: AlignError,
    },
}

impl CrossingOutcome {
    /// Crossing identity.
    pub fn crossing(&self) -> CrossingKey {
        match self {
            CrossingOutcome::Aligned(result) => result.crossing,
            CrossingOutcome::Failed { crossing, .. } => *crossing,
        }
    }

    /// True for `Aligned`.
    pub fn is_aligned(&self) -> bool {
        matches!(self, CrossingOutcome::Aligned(_))
    }
}

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatchSummary {
    /// Crossings started
    pub attempted: usize,
    /// Crossings aligned
    pub succeeded: usize,
    /// Crossings that failed
    pub failed: usize,
    /// Wall time for the whole run
    pub elapsed: Duration,
}

impl BatchSummary {
    fn merge(&mut self, other: &BatchSummary) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    fn count(&mut self, outcome: &CrossingOutcome) {
        self.attempted += 1;
        if outcome.is_aligned() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Drives the alignment pipeline over a project's crossings.
pub struct CrossingScheduler<'a> {
    project: &'a dyn ProjectStore,
    config: SchedulerConfig,
    pipeline: AlignmentPipeline,
}

impl<'a> CrossingScheduler<'a> {
    /// Create a scheduler over `project`.
    pub fn new(
        project: &'a dyn ProjectStore,
        config: SchedulerConfig,
        alignment: AlignmentConfig,
    ) -> Self {
        let pipeline = AlignmentPipeline::new(alignment).with_ignore_ties(config.ignore_ties);
        Self {
            project,
            config,
            pipeline,
        }
    }

    /// Get the scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Crossings a batch run would process.
    pub fn eligible(&self) -> Vec<&'a Crossing> {
        select_eligible(
            self.project.crossings(),
            self.config.min_overlap,
            self.config.include_untied,
        )
    }

    /// Load and align one crossing, converting every error into an outcome.
    ///
    /// A panic inside the crossing is caught and reported as a failure so the
    /// rest of the worker's chunk still runs.
    pub fn align_crossing(
        &self,
        crossing: &Crossing,
        observer: Option<&dyn CloudObserver>,
    ) -> CrossingOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.project
                .load_crossing_data(crossing)
                .and_then(|data| self.pipeline.run(crossing, data, observer))
        }));
        let result = attempt.unwrap_or_else(|payload| {
            Err(AlignError::Worker(format!(
                "crossing {} panicked: {}",
                crossing.key(),
                panic_message(&*payload)
            )))
        });
        match result {
            Ok(result) => CrossingOutcome::Aligned(result),
            Err(error) => CrossingOutcome::Failed {
                crossing: crossing.key(),
                error,
            },
        }
    }

    fn run_chunk(&self, chunk: &[&Crossing], log: &ResultLog) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for crossing in chunk {
            let outcome = self.align_crossing(crossing, None);
            log.report(&outcome);
            summary.count(&outcome);
        }
        summary
    }

    /// Run every eligible crossing across the worker pool.
    ///
    /// Blocks until all workers finish. Only thread start-up failures or a
    /// worker panic are errors; per-crossing failures are counted.
    pub fn run_batch(&self, log: &ResultLog) -> Result<BatchSummary> {
        let start = Instant::now();
        let eligible = self.eligible();
        let chunks = partition(&eligible, self.config.effective_workers());
        log::info!(
            "Aligning {} of {} crossings on {} workers",
            eligible.len(),
            self.project.crossings().len(),
            chunks.len()
        );

        let partials = thread::scope(|scope| -> Result<Vec<BatchSummary>> {
            let mut handles = Vec::with_capacity(chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                let handle = thread::Builder::new()
                    .name(format!("align-{}", i))
                    .spawn_scoped(scope, move || self.run_chunk(chunk, log))
                    .map_err(|e| AlignError::Worker(format!("failed to spawn worker {}: {}", i, e)))?;
                handles.push(handle);
            }
            handles
                .into_iter()
                .enumerate()
                .map(|(i, handle)| {
                    handle
                        .join()
                        .map_err(|_| AlignError::Worker(format!("worker {} panicked", i)))
                })
                .collect()
        })?;

        let mut summary = BatchSummary::default();
        for partial in &partials {
            summary.merge(partial);
        }
        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    /// Run the single crossing matching `key`.
    ///
    /// A missing crossing is an error and nothing runs.
    pub fn run_single(
        &self,
        key: &CrossingKey,
        log: &ResultLog,
        observer: Option<&dyn CloudObserver>,
    ) -> Result<BatchSummary> {
        let start = Instant::now();
        let crossing = self
            .project
            .find_crossing(key)
            .ok_or(AlignError::CrossingNotFound(*key))?;
        log::info!(
            "Aligning crossing {} (overlap {}%, {} ties)",
            key,
            crossing.overlap,
            crossing.tie_count()
        );

        let outcome = self.align_crossing(crossing, observer);
        log.report(&outcome);

        let mut summary = BatchSummary::default();
        summary.count(&outcome);
        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    /// Single-crossing mode when a selector is configured, batch mode otherwise.
    pub fn run(&self, log: &ResultLog, observer: Option<&dyn CloudObserver>) -> Result<BatchSummary> {
        match self.config.crossing_key()? {
            Some(key) => self.run_single(&key, log, observer),
            None => self.run_batch(log),
        }
    }
}
