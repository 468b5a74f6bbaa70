//! TOML configuration file.

use super::{ConfigError, ExtractionConfig};
use crate::output::MatrixFormat;
use crate::source::ClipSelection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub clips: ClipsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where training clips come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipsConfig {
    /// Directory holding the clips.
    pub dir: PathBuf,
    /// Only clips whose name starts with this prefix; all clips when absent.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Default for ClipsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("clips"),
            prefix: None,
        }
    }
}

impl ClipsConfig {
    /// Returns the clip selection rule.
    pub fn selection(&self) -> ClipSelection {
        ClipSelection::from_prefix(self.prefix.clone())
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Matrix file path.
    pub path: PathBuf,
    /// Matrix serialization.
    #[serde(default)]
    pub format: MatrixFormat,
    /// Write a TOML manifest next to the matrix.
    #[serde(default = "default_true")]
    pub manifest: bool,
    /// Write Prometheus text metrics to this path.
    #[serde(default)]
    pub metrics: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("features.csv"),
            format: MatrixFormat::default(),
            manifest: true,
            metrics: None,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.extraction.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClipPolicy;
    use crate::sampling::{MarginPolicy, Packing};

    #[test]
    fn test_full_file_parses() {
        let config = FileConfig::from_toml(
            r#"
            [extraction]
            spatial_size = 8
            temporal_size = 4
            num_patches = 20
            packing = "row_major"
            seed = 1234
            on_clip_error = "skip"
            workers = 4
            margin = { kind = "fixed", margin = 2 }

            [clips]
            dir = "/data/kth"
            prefix = "actioncliptrain"

            [output]
            path = "out/features.bin"
            format = "binary"
            metrics = "out/metrics.prom"
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction.spatial_size, 8);
        assert_eq!(config.extraction.feature_len(), 256);
        assert_eq!(config.extraction.packing, Packing::RowMajor);
        assert_eq!(config.extraction.margin, MarginPolicy::Fixed { margin: 2 });
        assert_eq!(config.extraction.on_clip_error, ClipPolicy::Skip);
        assert_eq!(config.extraction.seed, Some(1234));
        assert_eq!(
            config.clips.selection(),
            ClipSelection::Prefix("actioncliptrain".into())
        );
        assert_eq!(config.output.format, MatrixFormat::Binary);
        assert!(config.output.manifest);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = FileConfig::from_toml("[extraction]\nnum_patches = 5\n").unwrap();
        assert_eq!(config.extraction.num_patches, 5);
        assert_eq!(config.extraction.spatial_size, 16);
        assert_eq!(config.extraction.margin, MarginPolicy::default());
        assert_eq!(config.clips.selection(), ClipSelection::All);
        assert_eq!(config.output.format, MatrixFormat::Csv);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = FileConfig::from_toml("[extraction]\ntemporal_size = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidTemporalSize)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = FileConfig::from_toml("[extraction\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = FileConfig::from_file("/no/such/patchvol.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError(_))));
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = FileConfig::from_toml(include_str!("../../patchvol.toml")).unwrap();
        let defaults = ExtractionConfig::default();

        assert_eq!(config.extraction.feature_len(), defaults.feature_len());
        assert_eq!(config.extraction.margin, defaults.margin);
        assert_eq!(config.extraction.packing, defaults.packing);
        assert_eq!(config.output.path, OutputConfig::default().path);
    }
}
