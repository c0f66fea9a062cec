//! Least-squares rigid transform between paired point sets.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::core::transform::from_parts;

/// Rigid transform minimizing `Σ ‖R·s + t − d‖²` over paired points (Kabsch).
///
/// Returns `None` for fewer than three pairs, mismatched lengths, or a
/// failed decomposition.
///
/// # Algorithm
///
/// ```text
/// c_s, c_d = centroids
/// H = Σ (d − c_d)(s − c_s)ᵀ
/// U Σ Vᵀ = svd(H)
/// R = U Vᵀ          (flip U's last column if det(R) < 0)
/// t = c_d − R c_s
/// ```
pub fn solve_rigid(source: &[Point3<f64>], target: &[Point3<f64>]) -> Option<Matrix4<f64>> {
    if source.len() != target.len() || source.len() < 3 {
        return None;
    }

    let n = source.len() as f64;
    let mut c_s = Vector3::zeros();
    let mut c_d = Vector3::zeros();
    for (s, d) in source.iter().zip(target.iter()) {
        c_s += s.coords;
        c_d += d.coords;
    }
    c_s /= n;
    c_d /= n;

    let mut h = Matrix3::zeros();
    for (s, d) in source.iter().zip(target.iter()) {
        h += (d.coords - c_d) * (s.coords - c_s).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fix = u;
        u_fix.column_mut(2).neg_mut();
        r = u_fix * v_t;
    }

    let t = c_d - r * c_s;
    let m = from_parts(&r, &t);
    if m.iter().all(|v| v.is_finite()) {
        Some(m)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::{RigidDecomposition, rotation_part};
    use approx::assert_relative_eq;

    fn tetra() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.5),
            Point3::new(0.0, 3.0, -0.2),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(-2.0, 1.5, 0.7),
        ]
    }

    #[test]
    fn test_recovers_known_transform() {
        let truth = RigidDecomposition {
            tx: 1.5,
            ty: -2.0,
            tz: 0.3,
            rx: 0.01,
            ry: -0.02,
            rz: 0.2,
        }
        .to_matrix();
        let source = tetra();
        let target: Vec<Point3<f64>> = source
            .iter()
            .map(|p| truth.transform_point(p))
            .collect();

        let solved = solve_rigid(&source, &target).unwrap();
        for (a, b) in solved.iter().zip(truth.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_result_is_proper_rotation() {
        // Mirrored target must not produce a reflection
        let source = tetra();
        let target: Vec<Point3<f64>> = source.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();

        let solved = solve_rigid(&source, &target).unwrap();
        assert_relative_eq!(rotation_part(&solved).determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_too_few_pairs() {
        let source = tetra();
        assert!(solve_rigid(&source[..2], &source[..2]).is_none());
        assert!(solve_rigid(&source[..4], &source[..3]).is_none());
    }
}
