//! navadjust-icp - ICP registration of swath bathymetry crossings
//!
//! Estimates the rigid transform that aligns two overlapping survey sections
//! so a navigation adjustment can correct positioning drift.
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      main                           │  ← CLI
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Infrastructure
//! │   (project store, snapshots, result log, dumps)     │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │             (pipeline, scheduler)                   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │          algorithms/  ·  preprocessing/             │  ← Registration
//! │        (ICP engine, rejectors, filters)             │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │            sensors/  ·  geodesy/                    │  ← Sampling
//! │     (swath sampler, local frame projection)         │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │        (types, transforms, spatial index)           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Phases
//!
//! ## Phase 1: Sampling
//! - One geometry point per beam, draft from the source section
//! - Transverse Mercator projection into a shared local frame
//!
//! ## Phase 2: Cleaning
//! - Validity filtering
//! - Non-finite screening (fatal per crossing)
//! - Statistical outlier removal
//!
//! ## Phase 3: Registration
//! - Rough translation from ties or configuration
//! - Point-to-point ICP with distance, overlap, and one-to-one rejection
//! - Rough and fine correspondence fitness
//!
//! ## Phase 4: Batch
//! - Eligibility by ties and overlap
//! - Contiguous partitioning over up to 8 workers
//! - One CSV row per aligned crossing

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Sampling (depends on core)
// ============================================================================
pub mod geodesy;
pub mod sensors;

// ============================================================================
// Layer 3: Registration (depends on core)
// ============================================================================
pub mod algorithms;
pub mod preprocessing;

// ============================================================================
// Layer 4: Orchestration (depends on all of the above)
// ============================================================================
pub mod engine;

// ============================================================================
// Layer 5: I/O infrastructure (depends on all layers)
// ============================================================================
pub mod io;

pub mod config;
pub mod error;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use core::transform::RigidDecomposition;
pub use core::types::{
    CloudSide, Crossing, CrossingKey, GeometryPoint, Ping, PointCloud, Section, SectionRef, Swath,
    Tie,
};

// Sampling
pub use geodesy::{LocalFrameProjector, ProjectionError};
pub use sensors::{SectionReference, SwathSampler};

// Registration
pub use algorithms::registration::{
    Correspondence, RegistrationConfig, RegistrationEngine, RegistrationResult, RegistrationState,
    TerminationReason,
};
pub use preprocessing::{StatisticalOutlierConfig, StatisticalOutlierFilter};

// Orchestration
pub use engine::{
    AlignmentConfig, AlignmentPipeline, AlignmentResult, BatchSummary, CrossingOutcome,
    CrossingScheduler, SchedulerConfig,
};

// I/O
pub use io::{DebugDump, InMemoryProject, ProjectStore, ResultLog};

pub use config::AppConfig;
pub use error::{AlignError, Result};
