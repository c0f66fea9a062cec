//! Shared fixtures for integration tests.
//!
//! Builds synthetic survey sections over an analytic seafloor. Beam positions
//! are generated in a local metric frame and converted to geographic
//! coordinates through the inverse projection, so the pipeline's forward
//! projection recovers them to sub-millimetre accuracy.

#![allow(dead_code)]

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use navadjust_icp::{
    Crossing, InMemoryProject, LocalFrameProjector, Ping, Section, SectionRef, Swath, Tie,
};

/// Fixture origin latitude (degrees)
pub const ORIGIN_LAT: f64 = 36.8;
/// Fixture origin longitude (degrees)
pub const ORIGIN_LON: f64 = -121.9;

/// Start time of every synthetic section (epoch seconds)
const START_TIME: f64 = 1.6e9;

/// Navigation error applied to the source section in the standard scenario.
pub fn known_offset() -> Vector3<f64> {
    Vector3::new(6.0, -4.0, 0.5)
}

/// Seafloor depth (meters, positive down) at local (x, y).
///
/// Smooth, non-periodic over the fixture extent, with relief in every
/// direction so registration has no sliding direction.
pub fn seafloor_depth(x: f64, y: f64) -> f64 {
    40.0 - 2.0 * (x / 7.0).sin() - 1.5 * (y / 5.0).cos() - 0.01 * x * y
}

/// Layout of one synthetic survey grid.
#[derive(Debug, Clone, Copy)]
pub struct SurveyGrid {
    /// Half-width of the square footprint (meters)
    pub half_extent: f64,
    /// Beam and ping spacing (meters)
    pub spacing: f64,
    /// Uniform jitter amplitude on beam positions (meters)
    pub jitter: f64,
    /// RNG seed for the jitter
    pub seed: u64,
}

impl Default for SurveyGrid {
    fn default() -> Self {
        Self {
            half_extent: 20.0,
            spacing: 1.0,
            jitter: 0.1,
            seed: 42,
        }
    }
}

impl SurveyGrid {
    /// True beam positions, one row per ping, pings running north.
    pub fn rows(&self) -> Vec<Vec<(f64, f64)>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let steps = (2.0 * self.half_extent / self.spacing).round() as usize + 1;
        (0..steps)
            .map(|i| {
                let y = -self.half_extent + i as f64 * self.spacing;
                (0..steps)
                    .map(|j| {
                        let x = -self.half_extent + j as f64 * self.spacing;
                        (
                            x + rng.random_range(-self.jitter..=self.jitter),
                            y + rng.random_range(-self.jitter..=self.jitter),
                        )
                    })
                    .collect()
            })
            .collect()
    }

    /// Nominal northing of ping `i`.
    fn ping_northing(&self, i: usize) -> f64 {
        -self.half_extent + i as f64 * self.spacing
    }
}

/// Projector for the fixture origin.
pub fn projector() -> LocalFrameProjector {
    LocalFrameProjector::new(ORIGIN_LAT, ORIGIN_LON).expect("valid fixture origin")
}

/// Section observing the true seafloor at `rows` with navigation error `nav_error`.
///
/// Beams are recorded at `true - nav_error` horizontally and `nav_error.z`
/// deeper, so translating the section by `+nav_error` restores the truth.
pub fn observed_section(
    file_id: u32,
    section_id: u32,
    grid: &SurveyGrid,
    rows: &[Vec<(f64, f64)>],
    nav_error: Vector3<f64>,
) -> Section {
    let proj = projector();
    let pings = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let (navlon, navlat) =
                proj.inverse(-nav_error.x, grid.ping_northing(i) - nav_error.y);
            let mut ping = Ping {
                time_d: START_TIME + i as f64,
                navlon,
                navlat,
                heading: 0.0,
                ..Ping::default()
            };
            for &(x, y) in row {
                let (lon, lat) = proj.inverse(x - nav_error.x, y - nav_error.y);
                ping.beam_valid.push(true);
                ping.bath.push(seafloor_depth(x, y) + nav_error.z);
                ping.bathlon.push(lon);
                ping.bathlat.push(lat);
            }
            ping
        })
        .collect();
    Section::new(file_id, section_id, Swath::new(pings))
}

/// Target section (1, 0) and source section (2, 0) observing the same
/// beams, the source displaced by [`known_offset`].
pub fn crossing_pair() -> (Section, Section) {
    let grid = SurveyGrid::default();
    let rows = grid.rows();
    let target = observed_section(1, 0, &grid, &rows, Vector3::zeros());
    let source = observed_section(2, 0, &grid, &rows, known_offset());
    (target, source)
}

/// Project holding [`crossing_pair`] and one crossing between them.
///
/// `tie` seeds the crossing's first tie when given.
pub fn single_crossing_project(overlap: u32, tie: Option<Vector3<f64>>) -> InMemoryProject {
    let (target, source) = crossing_pair();
    let mut crossing = Crossing::new(SectionRef::new(1, 0), SectionRef::new(2, 0), overlap);
    if let Some(t) = tie {
        crossing = crossing.with_tie(Tie::new(t.x, t.y, t.z));
    }

    let mut project = InMemoryProject::new("synthetic");
    project.add_section(target);
    project.add_section(source);
    project.add_crossing(crossing);
    project
}

/// Tie offset close to [`known_offset`] but not exact.
pub fn rough_tie() -> Vector3<f64> {
    known_offset() + Vector3::new(0.3, -0.2, -0.1)
}
