//! Swath bathymetry types.
//!
//! A section is one pass of the survey platform. Its swath is an ordered
//! sequence of pings; each ping carries parallel beam arrays (same index space).

use serde::{Deserialize, Serialize};

/// One ping: navigation plus parallel per-beam arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Ping {
    /// Ping time (epoch seconds)
    pub time_d: f64,
    /// Vehicle longitude (degrees)
    pub navlon: f64,
    /// Vehicle latitude (degrees)
    pub navlat: f64,
    /// Vehicle heading (degrees, clockwise from north)
    pub heading: f64,
    /// Beam usable flags
    pub beam_valid: Vec<bool>,
    /// Beam depths (meters, positive down)
    pub bath: Vec<f64>,
    /// Beam longitudes (degrees)
    pub bathlon: Vec<f64>,
    /// Beam latitudes (degrees)
    pub bathlat: Vec<f64>,
}

impl Ping {
    /// Number of beams.
    #[inline]
    pub fn len(&self) -> usize {
        self.bath.len()
    }

    /// Check if the ping has no beams.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bath.is_empty()
    }

    /// Number of beams flagged usable.
    pub fn valid_count(&self) -> usize {
        self.beam_valid.iter().filter(|&&v| v).count()
    }

    /// Validate that the beam arrays are parallel.
    pub fn validate(&self) -> Result<(), &'static str> {
        let n = self.bath.len();
        if self.beam_valid.len() != n {
            return Err("beam_valid and bath length mismatch");
        }
        if self.bathlon.len() != n {
            return Err("bathlon and bath length mismatch");
        }
        if self.bathlat.len() != n {
            return Err("bathlat and bath length mismatch");
        }
        Ok(())
    }
}

/// Ordered pings of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Swath {
    /// Pings in acquisition order
    pub pings: Vec<Ping>,
}

impl Swath {
    /// Create a swath from pings.
    pub fn new(pings: Vec<Ping>) -> Self {
        Self { pings }
    }

    /// Number of pings.
    #[inline]
    pub fn len(&self) -> usize {
        self.pings.len()
    }

    /// Check if the swath has no pings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pings.is_empty()
    }

    /// Total number of beams over all pings.
    pub fn beam_count(&self) -> usize {
        self.pings.iter().map(Ping::len).sum()
    }

    /// Validate every ping.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.pings.iter().try_for_each(Ping::validate)
    }
}

/// Read-only section metadata handed out by the project store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SectionInfo {
    /// Owning file id
    pub file_id: u32,
    /// Section id within the file
    pub section_id: u32,
    /// Number of pings in the swath
    pub num_pings: usize,
    /// Maximum beams per ping
    pub num_beams: usize,
    /// Start time (epoch seconds)
    pub start_time_d: f64,
    /// End time (epoch seconds)
    pub end_time_d: f64,
}

/// A section: metadata plus its hydrated swath.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Section {
    /// Metadata
    pub info: SectionInfo,
    /// Swath data
    pub swath: Swath,
}

impl Section {
    /// Build a section, deriving metadata from the swath.
    pub fn new(file_id: u32, section_id: u32, swath: Swath) -> Self {
        let num_beams = swath.pings.iter().map(Ping::len).max().unwrap_or(0);
        let start_time_d = swath.pings.first().map(|p| p.time_d).unwrap_or(0.0);
        let end_time_d = swath.pings.last().map(|p| p.time_d).unwrap_or(0.0);
        Self {
            info: SectionInfo {
                file_id,
                section_id,
                num_pings: swath.len(),
                num_beams,
                start_time_d,
                end_time_d,
            },
            swath,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(n: usize) -> Ping {
        Ping {
            beam_valid: vec![true; n],
            bath: vec![100.0; n],
            bathlon: vec![0.0; n],
            bathlat: vec![0.0; n],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_parallel_arrays() {
        assert!(ping(5).validate().is_ok());

        let mut bad = ping(5);
        bad.bathlat.pop();
        assert!(bad.validate().is_err());

        let swath = Swath::new(vec![ping(3), bad]);
        assert!(swath.validate().is_err());
    }

    #[test]
    fn test_section_metadata() {
        let mut p1 = ping(3);
        p1.time_d = 10.0;
        let mut p2 = ping(4);
        p2.time_d = 12.5;
        let section = Section::new(2, 7, Swath::new(vec![p1, p2]));

        assert_eq!(section.info.file_id, 2);
        assert_eq!(section.info.section_id, 7);
        assert_eq!(section.info.num_pings, 2);
        assert_eq!(section.info.num_beams, 4);
        assert_eq!(section.info.start_time_d, 10.0);
        assert_eq!(section.info.end_time_d, 12.5);
        assert_eq!(section.swath.beam_count(), 7);
    }

    #[test]
    fn test_valid_count() {
        let mut p = ping(4);
        p.beam_valid[1] = false;
        assert_eq!(p.valid_count(), 3);
    }
}
