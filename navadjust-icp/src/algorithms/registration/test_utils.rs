//! Shared test utilities for registration tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::types::PointCloud;

/// Smooth synthetic seafloor height (meters, up positive).
pub fn seafloor_height(x: f64, y: f64) -> f64 {
    -40.0 + 4.0 * (x / 7.0).sin() + 3.0 * (y / 5.0).cos() + 0.02 * x * y / 10.0
}

/// Jittered `size × size` grid sampled from [`seafloor_height`] at 1 m spacing.
///
/// Jitter keeps coordinates distinct on every axis.
pub fn create_seafloor(size: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cloud = PointCloud::with_capacity(size * size);
    for i in 0..size {
        for j in 0..size {
            let x = i as f64 + rng.random_range(-0.1..0.1);
            let y = j as f64 + rng.random_range(-0.1..0.1);
            cloud.push_xyz(x, y, seafloor_height(x, y));
        }
    }
    cloud
}
