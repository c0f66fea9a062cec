//! Algorithms layer.
//!
//! Depends on core. Provides the rigid registration engine used by the
//! alignment pipeline.
//!
//! - [`registration`]: Point-to-point ICP with pluggable correspondence rejection

pub mod registration;
