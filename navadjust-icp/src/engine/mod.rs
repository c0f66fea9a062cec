//! Alignment orchestration layer.
//!
//! This layer turns crossings into registration results.
//!
//! # Contents
//!
//! - [`pipeline`]: One crossing, swaths in, [`AlignmentResult`] out
//! - [`scheduler`]: Crossing selection, partitioning, and the worker pool

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{
    AlignmentConfig, AlignmentPipeline, AlignmentResult, CloudObserver, CloudStage,
    rough_translation,
};
pub use scheduler::{
    BatchSummary, CrossingOutcome, CrossingScheduler, SchedulerConfig, partition, select_eligible,
};
