//! Depth and distance colour ramps for debug point clouds.

use std::sync::LazyLock;

/// Number of entries in the depth ramp.
pub const RAMP_SIZE: usize = 64;

/// Viridis control points, evenly spaced from 0 to 1.
const VIRIDIS_ANCHORS: [[f64; 3]; 9] = [
    [68.0, 1.0, 84.0],
    [71.0, 44.0, 122.0],
    [59.0, 81.0, 139.0],
    [44.0, 113.0, 142.0],
    [33.0, 144.0, 141.0],
    [39.0, 173.0, 129.0],
    [92.0, 200.0, 99.0],
    [170.0, 220.0, 50.0],
    [253.0, 231.0, 37.0],
];

static DEPTH_RAMP: LazyLock<[[u8; 3]; RAMP_SIZE]> = LazyLock::new(build_ramp);

fn build_ramp() -> [[u8; 3]; RAMP_SIZE] {
    let segments = (VIRIDIS_ANCHORS.len() - 1) as f64;
    let mut ramp = [[0u8; 3]; RAMP_SIZE];
    for (i, entry) in ramp.iter_mut().enumerate() {
        let t = i as f64 / (RAMP_SIZE - 1) as f64 * segments;
        let lo = (t.floor() as usize).min(VIRIDIS_ANCHORS.len() - 2);
        let frac = t - lo as f64;
        for c in 0..3 {
            let a = VIRIDIS_ANCHORS[lo][c];
            let b = VIRIDIS_ANCHORS[lo + 1][c];
            entry[c] = (a + (b - a) * frac).round().clamp(0.0, 255.0) as u8;
        }
    }
    ramp
}

/// The shared depth ramp, dark (low) to bright (high).
pub fn depth_ramp() -> &'static [[u8; 3]; RAMP_SIZE] {
    &DEPTH_RAMP
}

/// Ramp colour for `value` within `[min, max]`.
///
/// Values outside the range clamp to the ends; a degenerate range maps to the
/// middle of the ramp.
pub fn depth_color(value: f64, min: f64, max: f64) -> [u8; 3] {
    let span = max - min;
    let t = if span > 0.0 && value.is_finite() {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };
    DEPTH_RAMP[(t * (RAMP_SIZE - 1) as f64).round() as usize]
}

/// Green at 0, red at 1, for normalized correspondence distance.
pub fn distance_color(normalized: f64) -> [u8; 3] {
    let t = if normalized.is_finite() {
        normalized.clamp(0.0, 1.0)
    } else {
        1.0
    };
    [(255.0 * t).round() as u8, (255.0 * (1.0 - t)).round() as u8, 0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        let ramp = depth_ramp();
        assert_eq!(ramp[0], [68, 1, 84]);
        assert_eq!(ramp[RAMP_SIZE - 1], [253, 231, 37]);
    }

    #[test]
    fn test_ramp_brightens() {
        let ramp = depth_ramp();
        let green: Vec<u8> = ramp.iter().map(|c| c[1]).collect();
        assert!(green.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_depth_color_clamps() {
        assert_eq!(depth_color(-100.0, -50.0, -10.0), depth_ramp()[0]);
        assert_eq!(depth_color(0.0, -50.0, -10.0), depth_ramp()[RAMP_SIZE - 1]);
        assert_eq!(depth_color(3.0, 3.0, 3.0), depth_ramp()[32]);
    }

    #[test]
    fn test_distance_color() {
        assert_eq!(distance_color(0.0), [0, 255, 0]);
        assert_eq!(distance_color(1.0), [255, 0, 0]);
        assert_eq!(distance_color(f64::NAN), [255, 0, 0]);
    }
}
