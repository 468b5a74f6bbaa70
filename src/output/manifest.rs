//! Run manifest written next to the matrix.
//!
//! Records enough to reproduce the run and to map every column back
//! to its clip.

use super::OutputError;
use crate::assembly::{Assembly, ClipRecord};
use crate::config::ExtractionConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Description of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// When the matrix was written.
    pub generated_at: DateTime<Utc>,
    /// Crate version that produced it.
    pub version: String,
    /// Matrix row count.
    pub rows: usize,
    /// Matrix column count.
    pub columns: usize,
    /// Master seed of the run.
    pub master_seed: u64,
    /// Extraction parameters.
    pub extraction: ExtractionConfig,
    /// Column layout, one entry per listed clip.
    pub clips: Vec<ClipRecord>,
}

impl Manifest {
    /// Describes a finished assembly.
    pub fn new(assembly: &Assembly, config: &ExtractionConfig) -> Self {
        Self {
            generated_at: Utc::now(),
            version: crate::VERSION.to_string(),
            rows: assembly.matrix.rows(),
            columns: assembly.matrix.columns(),
            master_seed: assembly.master_seed,
            extraction: ExtractionConfig {
                seed: Some(assembly.master_seed),
                ..config.clone()
            },
            clips: assembly.clips.clone(),
        }
    }

    /// Default manifest path for a matrix file: `<matrix>.manifest.toml`.
    pub fn path_for(matrix_path: &Path) -> PathBuf {
        let mut name = matrix_path.as_os_str().to_owned();
        name.push(".manifest.toml");
        PathBuf::from(name)
    }

    /// Serializes to TOML.
    pub fn to_toml(&self) -> Result<String, OutputError> {
        toml::to_string_pretty(self).map_err(|e| OutputError::Manifest(e.to_string()))
    }

    /// Writes the manifest to `path`.
    pub fn write(&self, path: &Path) -> Result<(), OutputError> {
        std::fs::write(path, self.to_toml()?).map_err(|source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Wrote manifest");
        Ok(())
    }

    /// Reads a manifest back.
    pub fn read(path: &Path) -> Result<Self, OutputError> {
        let text = std::fs::read_to_string(path).map_err(|source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| OutputError::Manifest(e.to_string()))
    }
}
