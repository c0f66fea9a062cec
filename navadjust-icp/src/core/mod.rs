//! Core foundation layer.
//!
//! This is the bottom layer of the registration stack with no internal dependencies.
//! All other layers depend on core.
//!
//! # Contents
//!
//! - [`types`]: Core data types (geometry points, clouds, swaths, crossings)
//! - [`transform`]: Rigid 4×4 transform helpers (composition, decomposition, magnitude)
//! - [`spatial`]: Nearest-neighbour index over a cloud

pub mod spatial;
pub mod transform;
pub mod types;
