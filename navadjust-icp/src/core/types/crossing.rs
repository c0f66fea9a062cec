//! Crossing and tie types.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to one section of one survey file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionRef {
    /// File id within the project
    pub file_id: u32,
    /// Section id within the file
    pub section_id: u32,
}

impl SectionRef {
    /// Create a new section reference.
    pub fn new(file_id: u32, section_id: u32) -> Self {
        Self {
            file_id,
            section_id,
        }
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_id, self.section_id)
    }
}

/// Rough 3D offset recorded for a crossing (meters).
///
/// Only ever used as the registration initial guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Tie {
    /// East offset
    pub offset_x_m: f64,
    /// North offset
    pub offset_y_m: f64,
    /// Vertical offset
    pub offset_z_m: f64,
}

impl Tie {
    /// Create a new tie.
    pub fn new(offset_x_m: f64, offset_y_m: f64, offset_z_m: f64) -> Self {
        Self {
            offset_x_m,
            offset_y_m,
            offset_z_m,
        }
    }

    /// Offset as a vector.
    pub fn offset(&self) -> Vector3<f64> {
        Vector3::new(self.offset_x_m, self.offset_y_m, self.offset_z_m)
    }
}

/// Error parsing a [`CrossingKey`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
    /// Not of the form `f1:s1/f2:s2`
    #[error("expected FILE:SECTION/FILE:SECTION, got '{0}'")]
    Malformed(String),
    /// A component was not an unsigned integer
    #[error("invalid id '{0}'")]
    InvalidId(String),
}

/// Explicit selector of one crossing: target section then source section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossingKey {
    /// First (target) section
    pub target: SectionRef,
    /// Second (source) section
    pub source: SectionRef,
}

impl CrossingKey {
    /// Create a key from four ids.
    pub fn new(file_1: u32, section_1: u32, file_2: u32, section_2: u32) -> Self {
        Self {
            target: SectionRef::new(file_1, section_1),
            source: SectionRef::new(file_2, section_2),
        }
    }
}

impl fmt::Display for CrossingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target, self.source)
    }
}

fn parse_section_ref(text: &str, whole: &str) -> Result<SectionRef, ParseKeyError> {
    let (file, section) = text
        .split_once(':')
        .ok_or_else(|| ParseKeyError::Malformed(whole.to_string()))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| ParseKeyError::InvalidId(s.trim().to_string()))
    };
    Ok(SectionRef::new(parse(file)?, parse(section)?))
}

impl FromStr for CrossingKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, second) = s
            .split_once('/')
            .ok_or_else(|| ParseKeyError::Malformed(s.to_string()))?;
        Ok(Self {
            target: parse_section_ref(first, s)?,
            source: parse_section_ref(second, s)?,
        })
    }
}

/// Candidate spatial overlap between two sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    /// Target section (held fixed)
    pub target: SectionRef,
    /// Source section (moved onto the target)
    pub source: SectionRef,
    /// Estimated overlap percentage (0-100)
    pub overlap: u32,
    /// Previously computed or confirmed rough offsets
    pub ties: Vec<Tie>,
}

impl Crossing {
    /// Create a crossing without ties.
    pub fn new(target: SectionRef, source: SectionRef, overlap: u32) -> Self {
        Self {
            target,
            source,
            overlap,
            ties: Vec::new(),
        }
    }

    /// Builder-style tie attachment.
    pub fn with_tie(mut self, tie: Tie) -> Self {
        self.ties.push(tie);
        self
    }

    /// Number of ties.
    #[inline]
    pub fn tie_count(&self) -> usize {
        self.ties.len()
    }

    /// Selector key for this crossing.
    pub fn key(&self) -> CrossingKey {
        CrossingKey {
            target: self.target,
            source: self.source,
        }
    }
}
