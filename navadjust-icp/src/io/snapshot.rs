//! Project snapshot files.
//!
//! # File Format
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Magic: "NAVP" (4 bytes)                          │
//! │ Version: u16 (little endian)                     │
//! ├──────────────────────────────────────────────────┤
//! │ postcard payload (InMemoryProject)               │
//! └──────────────────────────────────────────────────┘
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::project::InMemoryProject;
use crate::error::{AlignError, Result};

/// Magic bytes at the start of every snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"NAVP";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

const HEADER_SIZE: usize = 6;

/// Write a project snapshot.
pub fn save(project: &InMemoryProject, path: impl AsRef<Path>) -> Result<()> {
    let payload = postcard::to_allocvec(project)?;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&SNAPSHOT_MAGIC)?;
    writer.write_all(&SNAPSHOT_VERSION.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read a project snapshot.
pub fn load(path: impl AsRef<Path>) -> Result<InMemoryProject> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}

/// Decode a snapshot held in memory.
pub fn decode(bytes: &[u8]) -> Result<InMemoryProject> {
    if bytes.len() < HEADER_SIZE {
        return Err(AlignError::Project(format!(
            "snapshot truncated: {} bytes",
            bytes.len()
        )));
    }
    if bytes[..4] != SNAPSHOT_MAGIC {
        return Err(AlignError::Project(
            "invalid snapshot magic bytes".to_string(),
        ));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != SNAPSHOT_VERSION {
        return Err(AlignError::Project(format!(
            "unsupported snapshot version {} (expected {})",
            version, SNAPSHOT_VERSION
        )));
    }
    Ok(postcard::from_bytes(&bytes[HEADER_SIZE..])?)
}
