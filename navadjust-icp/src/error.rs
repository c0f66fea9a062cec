//! Error types for navadjust-icp

use crate::core::types::{CloudSide, CrossingKey};
use crate::geodesy::ProjectionError;

/// Result type alias
pub type Result<T> = std::result::Result<T, AlignError>;

/// Alignment error types
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Project store could not be loaded or decoded
    #[error("Project error: {0}")]
    Project(String),

    /// Snapshot payload could not be encoded or decoded
    #[error("Snapshot encoding error: {0}")]
    Snapshot(#[from] postcard::Error),

    /// No crossing matches the requested key
    #[error("Crossing {0} not found")]
    CrossingNotFound(CrossingKey),

    /// Section referenced by a crossing is missing from the project
    #[error("Section {file_id}:{section_id} not found")]
    SectionNotFound {
        /// File id
        file_id: u32,
        /// Section id within the file
        section_id: u32,
    },

    /// Swath has no pings
    #[error("{side} swath has no pings")]
    EmptySwath {
        /// Which cloud the swath feeds
        side: CloudSide,
    },

    /// Beam arrays of a ping are not parallel
    #[error("{side} swath is malformed: {reason}")]
    MalformedSwath {
        /// Which cloud the swath feeds
        side: CloudSide,
        /// First inconsistency found
        reason: &'static str,
    },

    /// Local frame projection could not be built
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Cloud contains NaN or infinite coordinates after projection
    #[error("{side} cloud has {count} non-finite points")]
    NonFinite {
        /// Offending cloud
        side: CloudSide,
        /// Number of non-finite points
        count: usize,
    },

    /// Cloud too small to register
    #[error("{side} cloud has {count} points, need at least {required}")]
    TooFewPoints {
        /// Offending cloud
        side: CloudSide,
        /// Points available
        count: usize,
        /// Points required
        required: usize,
    },

    /// Registration did not produce enough correspondences to solve
    #[error("Registration failed: {0}")]
    Registration(String),

    /// Worker thread could not be started or panicked
    #[error("Worker error: {0}")]
    Worker(String),
}
