//! Point cloud type for registration.

use std::fmt;

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::point::GeometryPoint;

/// Which member of a crossing a cloud belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudSide {
    /// Reference section (held fixed)
    Target,
    /// Section being moved onto the target
    Source,
}

impl fmt::Display for CloudSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudSide::Target => write!(f, "target"),
            CloudSide::Source => write!(f, "source"),
        }
    }
}

/// Collection of 3D points in the local tangent-plane frame (meters).
///
/// Used as the output of cloud filtering and input to registration. Indices are
/// stable for the lifetime of a cloud, so correspondences can refer to them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    /// Points in meters (x east, y north, z up)
    pub points: Vec<Point3<f64>>,
}

impl PointCloud {
    /// Create an empty point cloud.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create from a vector of points.
    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// Create from projected geometry points, ignoring their validity flag.
    ///
    /// Callers drop invalid points first with
    /// [`drop_invalid`](crate::preprocessing::drop_invalid).
    pub fn from_geometry(points: &[GeometryPoint]) -> Self {
        Self {
            points: points.iter().map(GeometryPoint::position).collect(),
        }
    }

    /// Add a point.
    #[inline]
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Add a point by x, y, z coordinates.
    #[inline]
    pub fn push_xyz(&mut self, x: f64, y: f64, z: f64) {
        self.points.push(Point3::new(x, y, z));
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get point at index.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    #[inline]
    pub fn point_at(&self, i: usize) -> Point3<f64> {
        self.points[i]
    }

    /// Iterate over points.
    pub fn iter(&self) -> impl Iterator<Item = &Point3<f64>> + '_ {
        self.points.iter()
    }

    /// Mean position, or `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.points.len() as f64))
    }

    /// Minimum and maximum z, or `None` for an empty cloud.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let mut min_z = f64::MAX;
        let mut max_z = f64::MIN;
        for p in &self.points {
            min_z = min_z.min(p.z);
            max_z = max_z.max(p.z);
        }
        Some((min_z, max_z))
    }

    /// Apply a homogeneous rigid transform to every point, returning a new cloud.
    pub fn transformed(&self, transform: &Matrix4<f64>) -> PointCloud {
        PointCloud {
            points: self
                .points
                .iter()
                .map(|p| transform.transform_point(p))
                .collect(),
        }
    }

    /// Apply a homogeneous rigid transform in place.
    pub fn transform_in_place(&mut self, transform: &Matrix4<f64>) {
        for p in self.points.iter_mut() {
            *p = transform.transform_point(p);
        }
    }

    /// Number of points with at least one non-finite coordinate.
    pub fn non_finite_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
            .count()
    }

    /// Points as plain arrays, the layout the k-d tree is built from.
    pub fn to_rows(&self) -> Vec<[f64; 3]> {
        self.points.iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::translation;
    use approx::assert_relative_eq;

    #[test]
    fn test_centroid() {
        let mut cloud = PointCloud::new();
        cloud.push_xyz(0.0, 0.0, 0.0);
        cloud.push_xyz(2.0, 4.0, -6.0);

        let c = cloud.centroid().unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 2.0);
        assert_relative_eq!(c.z, -3.0);
    }

    #[test]
    fn test_centroid_empty() {
        assert!(PointCloud::new().centroid().is_none());
    }

    #[test]
    fn test_transformed_translation() {
        let mut cloud = PointCloud::new();
        cloud.push_xyz(1.0, 1.0, 1.0);

        let moved = cloud.transformed(&translation(1.0, -2.0, 0.5));
        assert_relative_eq!(moved.point_at(0).x, 2.0);
        assert_relative_eq!(moved.point_at(0).y, -1.0);
        assert_relative_eq!(moved.point_at(0).z, 1.5);
        // Original untouched
        assert_relative_eq!(cloud.point_at(0).x, 1.0);
    }

    #[test]
    fn test_non_finite_count() {
        let mut cloud = PointCloud::new();
        cloud.push_xyz(1.0, 1.0, 1.0);
        cloud.push_xyz(f64::NAN, 1.0, 1.0);
        cloud.push_xyz(1.0, 1.0, f64::INFINITY);
        assert_eq!(cloud.non_finite_count(), 2);
    }

    #[test]
    fn test_z_range() {
        let mut cloud = PointCloud::new();
        cloud.push_xyz(0.0, 0.0, -5.0);
        cloud.push_xyz(0.0, 0.0, 3.0);
        cloud.push_xyz(0.0, 0.0, 1.0);
        assert_eq!(cloud.z_range(), Some((-5.0, 3.0)));
    }

    #[test]
    fn test_side_display() {
        assert_eq!(CloudSide::Target.to_string(), "target");
        assert_eq!(CloudSide::Source.to_string(), "source");
    }
}
