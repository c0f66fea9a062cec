//! Validity filtering.

use crate::core::types::GeometryPoint;

/// Keep only points whose validity flag is set.
///
/// Order is preserved, so applying it twice gives the same result as once.
pub fn drop_invalid(points: &[GeometryPoint]) -> Vec<GeometryPoint> {
    points.iter().filter(|p| p.valid).copied().collect()
}
