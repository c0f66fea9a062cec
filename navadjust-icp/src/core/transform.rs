//! Rigid 4×4 homogeneous transform helpers.
//!
//! Transforms are plain `nalgebra::Matrix4<f64>` so they compose with `*` and
//! export row-major without conversion. Rotation is always the upper-left 3×3
//! block, translation the last column.
//!
//! ```text
//! ┌ R00 R01 R02 tx ┐
//! │ R10 R11 R12 ty │
//! │ R20 R21 R22 tz │
//! └  0   0   0   1 ┘
//! ```

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Pure translation transform.
#[inline]
pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Assemble a rigid transform from rotation and translation.
pub fn from_parts(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// Upper-left rotation block.
#[inline]
pub fn rotation_part(m: &Matrix4<f64>) -> Matrix3<f64> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Translation column.
#[inline]
pub fn translation_part(m: &Matrix4<f64>) -> Vector3<f64> {
    m.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Rotation angle (radians) of a rotation matrix.
///
/// Cosine from the trace, sine from the skew part, so tiny angles keep full
/// precision instead of collapsing through `acos` near 1.
pub fn rotation_angle(r: &Matrix3<f64>) -> f64 {
    let cos_theta = (r.trace() - 1.0) * 0.5;
    let skew = Vector3::new(
        r[(2, 1)] - r[(1, 2)],
        r[(0, 2)] - r[(2, 0)],
        r[(1, 0)] - r[(0, 1)],
    );
    let sin_theta = skew.norm() * 0.5;
    sin_theta.atan2(cos_theta)
}

/// Size of an incremental transform: ‖t‖ + |θ|.
///
/// Used as the transform-change convergence measure.
pub fn delta_magnitude(m: &Matrix4<f64>) -> f64 {
    translation_part(m).norm() + rotation_angle(&rotation_part(m))
}

/// Entries in row-major order (T0..T15).
pub fn to_row_major(m: &Matrix4<f64>) -> [f64; 16] {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = m[(row, col)];
        }
    }
    out
}

/// Translation plus XYZ Euler rotation of a rigid transform.
///
/// Rotation convention: `R = Rz(rz) · Ry(ry) · Rx(rx)` (roll, pitch, yaw).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RigidDecomposition {
    /// Translation x (meters)
    pub tx: f64,
    /// Translation y (meters)
    pub ty: f64,
    /// Translation z (meters)
    pub tz: f64,
    /// Rotation about x (radians)
    pub rx: f64,
    /// Rotation about y (radians)
    pub ry: f64,
    /// Rotation about z (radians)
    pub rz: f64,
}

impl RigidDecomposition {
    /// Decompose a rigid transform.
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        let t = translation_part(m);
        let (rx, ry, rz) = Rotation3::from_matrix_unchecked(rotation_part(m)).euler_angles();
        Self {
            tx: t.x,
            ty: t.y,
            tz: t.z,
            rx,
            ry,
            rz,
        }
    }

    /// Rebuild the transform.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let r = Rotation3::from_euler_angles(self.rx, self.ry, self.rz);
        from_parts(r.matrix(), &Vector3::new(self.tx, self.ty, self.tz))
    }
}
