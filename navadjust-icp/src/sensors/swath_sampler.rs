//! Swath to geometry point conversion.

use crate::core::types::{GeometryPoint, Swath};

/// Fixed correction subtracted from the mean valid depth to estimate draft.
///
/// Approximation until the sensor draft is carried per section.
pub const DRAFT_CORRECTION_M: f64 = 3.0;

/// Representative position of a section: its center ping plus a draft estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionReference {
    /// Center ping latitude (degrees)
    pub lat: f64,
    /// Center ping longitude (degrees)
    pub lon: f64,
    /// Mean valid depth minus [`DRAFT_CORRECTION_M`] (meters)
    pub draft: f64,
    /// Center ping heading (degrees)
    pub heading: f64,
}

/// Extracts geometry points from a swath.
///
/// Stateless; every beam becomes one point tagged with its beam flag, so the
/// output length always equals [`Swath::beam_count`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SwathSampler;

impl SwathSampler {
    /// Create a sampler.
    pub fn new() -> Self {
        Self
    }

    /// Convert every beam to a geographic point.
    ///
    /// `z = draft - depth`, so heights are up-positive relative to the draft.
    pub fn sample(&self, swath: &Swath, draft: f64) -> Vec<GeometryPoint> {
        let mut points = Vec::with_capacity(swath.beam_count());
        for ping in &swath.pings {
            for (((&valid, &depth), &lon), &lat) in ping
                .beam_valid
                .iter()
                .zip(ping.bath.iter())
                .zip(ping.bathlon.iter())
                .zip(ping.bathlat.iter())
            {
                points.push(GeometryPoint::geographic(lon, lat, draft - depth, valid));
            }
        }
        points
    }

    /// Center ping navigation and draft estimate.
    ///
    /// Returns `None` for a swath without pings. If no beam is valid the draft
    /// falls back to `-DRAFT_CORRECTION_M`.
    pub fn central_reference(&self, swath: &Swath) -> Option<SectionReference> {
        let center = swath.pings.get(swath.len() / 2)?;

        let mut depth_sum = 0.0;
        let mut depth_count = 0usize;
        for ping in &swath.pings {
            for (&valid, &depth) in ping.beam_valid.iter().zip(ping.bath.iter()) {
                if valid {
                    depth_sum += depth;
                    depth_count += 1;
                }
            }
        }
        let mean_depth = if depth_count > 0 {
            depth_sum / depth_count as f64
        } else {
            0.0
        };

        Some(SectionReference {
            lat: center.navlat,
            lon: center.navlon,
            draft: mean_depth - DRAFT_CORRECTION_M,
            heading: center.heading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Ping;
    use approx::assert_relative_eq;

    fn make_ping(navlat: f64, depths: &[f64], valid: &[bool]) -> Ping {
        let n = depths.len();
        Ping {
            time_d: 0.0,
            navlon: -122.0,
            navlat,
            heading: 45.0,
            beam_valid: valid.to_vec(),
            bath: depths.to_vec(),
            bathlon: (0..n).map(|i| -122.0 + i as f64 * 1e-5).collect(),
            bathlat: vec![navlat; n],
        }
    }

    #[test]
    fn test_sample_one_point_per_beam() {
        let swath = Swath::new(vec![
            make_ping(36.0, &[100.0, 101.0, 102.0], &[true, false, true]),
            make_ping(36.001, &[103.0, 104.0, 105.0], &[true, true, true]),
        ]);
        let points = SwathSampler::new().sample(&swath, 98.0);

        assert_eq!(points.len(), 6);
        assert!(points[0].valid);
        assert!(!points[1].valid);
        assert_relative_eq!(points[0].z, -2.0);
        assert_relative_eq!(points[5].z, -7.0);
        assert_relative_eq!(points[4].x, -122.0 + 1e-5);
        assert_relative_eq!(points[4].y, 36.001);
    }

    #[test]
    fn test_central_reference_picks_middle_ping() {
        let swath = Swath::new(vec![
            make_ping(36.0, &[10.0], &[true]),
            make_ping(36.1, &[20.0], &[true]),
            make_ping(36.2, &[30.0], &[true]),
            make_ping(36.3, &[40.0], &[true]),
        ]);
        let reference = SwathSampler::new().central_reference(&swath).unwrap();

        // floor(4 / 2) = 2
        assert_relative_eq!(reference.lat, 36.2);
        assert_relative_eq!(reference.lon, -122.0);
        assert_relative_eq!(reference.heading, 45.0);
    }

    #[test]
    fn test_draft_uses_valid_beams_only() {
        let swath = Swath::new(vec![
            make_ping(36.0, &[100.0, 500.0], &[true, false]),
            make_ping(36.1, &[110.0, 120.0], &[true, true]),
        ]);
        let reference = SwathSampler::new().central_reference(&swath).unwrap();

        assert_relative_eq!(reference.draft, 110.0 - DRAFT_CORRECTION_M);
    }

    #[test]
    fn test_empty_swath_has_no_reference() {
        assert!(SwathSampler::new().central_reference(&Swath::default()).is_none());
    }

    #[test]
    fn test_no_valid_beams() {
        let swath = Swath::new(vec![make_ping(36.0, &[100.0], &[false])]);
        let reference = SwathSampler::new().central_reference(&swath).unwrap();
        assert_relative_eq!(reference.draft, -DRAFT_CORRECTION_M);
    }
}
