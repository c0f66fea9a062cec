//! Geodesy layer.
//!
//! Converts geographic soundings into a local meters-based tangent-plane frame.
//!
//! - [`LocalFrameProjector`]: Transverse Mercator centered on a reference point
//! - [`Ellipsoid`]: Reference ellipsoid parameters (WGS-84 by default)

mod projection;

pub use projection::{Ellipsoid, LocalFrameProjector, ProjectionError};
