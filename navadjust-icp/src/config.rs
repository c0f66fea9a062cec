//! Application configuration.
//!
//! Loaded from TOML; every section and field is optional.
//!
//! ```toml
//! [scheduler]
//! min_overlap = 25
//! workers = 8
//!
//! [alignment]
//! max_iterations = 50
//! max_correspondence_distance = 20.0
//!
//! [alignment.source_outliers]
//! neighbor_count = 12
//!
//! [debug]
//! dump_dir = "dumps"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{AlignmentConfig, SchedulerConfig};
use crate::error::{AlignError, Result};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "navadjust-icp.toml";

/// Debug output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Directory for PLY dumps
    pub dump_dir: PathBuf,
    /// Colour dumped points by depth
    pub color_by_depth: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::from("."),
            color_by_depth: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Crossing selection and workers
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Per-crossing alignment parameters
    #[serde(default)]
    pub alignment: AlignmentConfig,
    /// Debug dumps
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            basic_toml::from_str(contents).map_err(|e| AlignError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if present, or defaults.
    ///
    /// An explicit path that cannot be read or parsed is an error; a broken
    /// default file is reported and ignored.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    AlignError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                let config = Self::from_toml_str(&contents)?;
                log::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            None => {
                if let Ok(contents) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                    match Self::from_toml_str(&contents) {
                        Ok(config) => {
                            log::info!("Loaded config from {}", DEFAULT_CONFIG_FILE);
                            return Ok(config);
                        }
                        Err(e) => log::warn!("Ignoring {}: {}", DEFAULT_CONFIG_FILE, e),
                    }
                }
                Ok(Self::default())
            }
        }
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.alignment.validate()?;
        self.scheduler.crossing_key()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scheduler.workers, 4);
        assert_eq!(config.alignment.max_iterations, 100);
        assert!(config.debug.color_by_depth);
    }

    #[test]
    fn test_sections_override() {
        let config = AppConfig::from_toml_str(
            r#"
            [scheduler]
            min_overlap = 25
            include_untied = true
            crossing = "2:0/5:1"

            [alignment]
            max_correspondence_distance = 15.0
            initial_translation = [1.0, -2.0, 0.5]

            [alignment.target_outliers]
            std_dev_multiplier = 1.5

            [debug]
            dump_dir = "dumps"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.min_overlap, 25);
        assert!(config.scheduler.include_untied);
        assert_eq!(config.scheduler.crossing.as_deref(), Some("2:0/5:1"));
        assert_eq!(config.alignment.max_correspondence_distance, 15.0);
        assert_eq!(config.alignment.initial_translation, [1.0, -2.0, 0.5]);
        assert_eq!(config.alignment.target_outliers.std_dev_multiplier, 1.5);
        assert!(config.alignment.target_outliers.enabled);
        assert_eq!(config.debug.dump_dir, PathBuf::from("dumps"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::from_toml_str("[alignment]\noverlap_fraction = 2.0\n").unwrap_err();
        assert!(matches!(err, AlignError::Config(_)));

        let err = AppConfig::from_toml_str("[scheduler]\ncrossing = \"bogus\"\n").unwrap_err();
        assert!(matches!(err, AlignError::Config(_)));

        let err = AppConfig::from_toml_str("[scheduler\n").unwrap_err();
        assert!(matches!(err, AlignError::Config(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\nworkers = 2").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.scheduler.workers, 2);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/navadjust.toml"))).unwrap_err();
        assert!(matches!(err, AlignError::Config(_)));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = AppConfig::from_toml_str(include_str!("../navadjust-icp.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
