//! Clip selection within a training directory.

use super::SourceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which entries of a directory are treated as training clips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipSelection {
    /// Every entry in the directory.
    #[default]
    All,
    /// Entries whose file name starts with the prefix, e.g. `actioncliptrain`.
    Prefix(String),
}

impl ClipSelection {
    /// Builds a selection from an optional prefix.
    pub fn from_prefix(prefix: Option<String>) -> Self {
        match prefix {
            Some(p) if !p.is_empty() => Self::Prefix(p),
            _ => Self::All,
        }
    }

    /// Returns true if the file name is selected.
    pub fn matches(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        match self {
            Self::All => true,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }

    /// Lists the selected clips in `dir`, sorted by file name.
    ///
    /// The order is part of the output contract: it decides which
    /// matrix columns hold which clip.
    pub fn resolve(&self, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut clips = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            if name.to_str().map(|n| self.matches(n)).unwrap_or(false) {
                clips.push(entry.path());
            }
        }
        clips.sort();

        tracing::info!(
            dir = %dir.display(),
            selection = ?self,
            clips = clips.len(),
            "Resolved training clips"
        );
        Ok(clips)
    }
}
