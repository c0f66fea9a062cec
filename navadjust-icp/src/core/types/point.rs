//! Sounding geometry point.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// One sounding, either geographic or projected.
///
/// Before projection `x` holds longitude and `y` latitude (degrees). After
/// [`LocalFrameProjector::project_points`](crate::geodesy::LocalFrameProjector::project_points)
/// they hold easting and northing in meters. `z` is always meters, positive up,
/// relative to the section draft reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryPoint {
    /// Longitude (degrees) or easting (meters)
    pub x: f64,
    /// Latitude (degrees) or northing (meters)
    pub y: f64,
    /// Height relative to the draft reference (meters, up positive)
    pub z: f64,
    /// Beam flag said this sounding is usable
    pub valid: bool,
}

impl GeometryPoint {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64, valid: bool) -> Self {
        Self { x, y, z, valid }
    }

    /// Create a geographic point from longitude/latitude in degrees.
    #[inline]
    pub fn geographic(lon: f64, lat: f64, z: f64, valid: bool) -> Self {
        Self::new(lon, lat, z, valid)
    }

    /// True if every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Position as an nalgebra point.
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

impl Default for GeometryPoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            valid: false,
        }
    }
}
