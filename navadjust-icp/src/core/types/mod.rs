//! Core data types for swath registration.
//!
//! Geometry types:
//! - [`GeometryPoint`]: One sounding in geographic or local coordinates plus validity
//! - [`PointCloud`]: Collection of valid 3D points in the local frame
//! - [`CloudSide`]: Which member of a crossing a cloud belongs to
//!
//! Survey types (consumed read-only from the project store):
//! - [`Swath`], [`Ping`]: One section's pings with parallel beam arrays
//! - [`Section`]: Section metadata plus its swath
//!
//! Project types:
//! - [`Crossing`], [`Tie`], [`CrossingKey`], [`SectionRef`]

mod cloud;
mod crossing;
mod point;
mod swath;

pub use cloud::{CloudSide, PointCloud};
pub use crossing::{Crossing, CrossingKey, ParseKeyError, SectionRef, Tie};
pub use point::GeometryPoint;
pub use swath::{Ping, Section, SectionInfo, Swath};
