//! Sensor data processing layer.
//!
//! Turns hydrated swaths into geometry points.
//!
//! - [`SwathSampler`]: One [`GeometryPoint`](crate::core::types::GeometryPoint) per beam
//! - [`SectionReference`]: Representative position and draft of a section

mod swath_sampler;

pub use swath_sampler::{DRAFT_CORRECTION_M, SectionReference, SwathSampler};
