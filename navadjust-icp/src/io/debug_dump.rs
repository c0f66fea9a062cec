//! Debug point cloud dumps.
//!
//! Writes ASCII PLY files named `<prefix>_<side>_<stage>.ply`, up to six per
//! crossing. Points are coloured by depth; in the final source dump, points
//! with a correspondence are coloured by their correspondence distance.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::colormap::{depth_color, distance_color};
use crate::algorithms::registration::Correspondence;
use crate::core::types::{CloudSide, CrossingKey, PointCloud};
use crate::engine::pipeline::{CloudObserver, CloudStage};
use crate::error::Result;

const UNCOLORED: [u8; 3] = [255, 255, 255];

/// Writes intermediate clouds of one crossing to disk.
#[derive(Debug, Clone)]
pub struct DebugDump {
    dir: PathBuf,
    prefix: String,
    color_by_depth: bool,
}

impl DebugDump {
    /// Dump files as `<dir>/<prefix>_<side>_<stage>.ply`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, color_by_depth: bool) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            color_by_depth,
        }
    }

    /// Dump named after a crossing: `icp_<f1>_<s1>_<f2>_<s2>`.
    pub fn for_crossing(dir: impl Into<PathBuf>, key: &CrossingKey, color_by_depth: bool) -> Self {
        let prefix = format!(
            "icp_{}_{}_{}_{}",
            key.target.file_id, key.target.section_id, key.source.file_id, key.source.section_id
        );
        Self::new(dir, prefix, color_by_depth)
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for one stage and side.
    pub fn path(&self, stage: CloudStage, side: CloudSide) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}.ply", self.prefix, side, stage.as_str()))
    }

    fn colors(&self, cloud: &PointCloud, correspondences: &[Correspondence]) -> Vec<[u8; 3]> {
        let mut colors = match (self.color_by_depth, cloud.z_range()) {
            (true, Some((z_min, z_max))) => cloud
                .iter()
                .map(|p| depth_color(p.z, z_min, z_max))
                .collect(),
            _ => vec![UNCOLORED; cloud.len()],
        };

        let max_distance = correspondences
            .iter()
            .map(|c| c.distance())
            .fold(0.0_f64, f64::max);
        for c in correspondences {
            if let Some(color) = colors.get_mut(c.source_index) {
                let normalized = if max_distance > 0.0 {
                    c.distance() / max_distance
                } else {
                    0.0
                };
                *color = distance_color(normalized);
            }
        }
        colors
    }

    /// Write one cloud, returning the file path.
    pub fn write_cloud(
        &self,
        stage: CloudStage,
        side: CloudSide,
        cloud: &PointCloud,
        correspondences: &[Correspondence],
    ) -> Result<PathBuf> {
        let path = self.path(stage, side);
        let colors = self.colors(cloud, correspondences);

        fs::create_dir_all(&self.dir)?;
        let mut w = BufWriter::new(File::create(&path)?);
        writeln!(w, "ply")?;
        writeln!(w, "format ascii 1.0")?;
        writeln!(w, "element vertex {}", cloud.len())?;
        for axis in ["x", "y", "z"] {
            writeln!(w, "property float {}", axis)?;
        }
        for channel in ["red", "green", "blue"] {
            writeln!(w, "property uchar {}", channel)?;
        }
        writeln!(w, "end_header")?;
        for (p, [r, g, b]) in cloud.iter().zip(colors) {
            writeln!(w, "{:.3} {:.3} {:.3} {} {} {}", p.x, p.y, p.z, r, g, b)?;
        }
        w.flush()?;

        log::debug!("Wrote {} points to {}", cloud.len(), path.display());
        Ok(path)
    }
}

impl CloudObserver for DebugDump {
    fn observe(
        &self,
        stage: CloudStage,
        side: CloudSide,
        cloud: &PointCloud,
        correspondences: &[Correspondence],
    ) {
        if let Err(e) = self.write_cloud(stage, side, cloud, correspondences) {
            log::warn!(
                "Failed to write {} {} cloud: {}",
                side,
                stage.as_str(),
                e
            );
        }
    }
}
