//! Extraction parameters.
//!
//! One immutable value is passed to every stage so that no stage can
//! see a configuration that changed halfway through a run.

use super::ConfigError;
use crate::sampling::{MarginPolicy, Packing, PatchSize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// What to do when a single clip fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipPolicy {
    /// Abort the whole run on the first failing clip.
    #[default]
    Abort,
    /// Log the failure, drop the clip's columns and continue.
    Skip,
}

/// Configuration for patch extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Patch edge length in x and y.
    pub spatial_size: usize,
    /// Patch depth in frames.
    pub temporal_size: usize,
    /// Patches sampled per clip.
    pub num_patches: usize,
    /// Element order within each slice.
    pub packing: Packing,
    /// Master seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Failure handling per clip.
    pub on_clip_error: ClipPolicy,
    /// Number of clips processed concurrently.
    pub workers: usize,
    /// Wall-clock limit per clip, in seconds in TOML; unlimited when absent.
    #[serde(default, with = "seconds")]
    pub clip_timeout: Option<Duration>,
    /// Margin evolution across draws.
    pub margin: MarginPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            spatial_size: 16,
            temporal_size: 10,
            num_patches: 100,
            packing: Packing::default(),
            seed: None,
            on_clip_error: ClipPolicy::default(),
            workers: 1,
            clip_timeout: None,
            margin: MarginPolicy::default(),
        }
    }
}

impl ExtractionConfig {
    /// Creates a configuration with the given patch shape and count.
    pub fn new(spatial_size: usize, temporal_size: usize, num_patches: usize) -> Self {
        Self {
            spatial_size,
            temporal_size,
            num_patches,
            ..Default::default()
        }
    }

    /// Returns the patch size.
    #[inline]
    pub fn patch_size(&self) -> PatchSize {
        PatchSize::new(self.spatial_size, self.temporal_size)
    }

    /// Length of each feature vector (matrix rows).
    #[inline]
    pub fn feature_len(&self) -> usize {
        self.patch_size().feature_len()
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spatial_size == 0 {
            return Err(ConfigError::InvalidSpatialSize);
        }
        if self.temporal_size == 0 {
            return Err(ConfigError::InvalidTemporalSize);
        }
        if self.num_patches == 0 {
            return Err(ConfigError::InvalidPatchCount);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.clip_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// `Option<Duration>` as fractional seconds.
mod seconds {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| D::Error::custom(format!("invalid clip_timeout {secs}: {e}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feature_len(), 16 * 16 * 10);
    }

    #[test]
    fn test_zero_sizes_invalid() {
        let mut config = ExtractionConfig::default();
        config.spatial_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpatialSize)
        ));

        let config = ExtractionConfig::new(4, 0, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTemporalSize)
        ));

        let config = ExtractionConfig::new(4, 2, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPatchCount)
        ));
    }

    #[test]
    fn test_zero_workers_invalid() {
        let config = ExtractionConfig {
            workers: 0,
            ..ExtractionConfig::new(4, 2, 3)
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWorkers)));
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let config = ExtractionConfig {
            clip_timeout: Some(Duration::ZERO),
            ..ExtractionConfig::new(4, 2, 3)
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_timeout_in_seconds() {
        let config: ExtractionConfig = toml::from_str("clip_timeout = 2.5").unwrap();
        assert_eq!(config.clip_timeout, Some(Duration::from_millis(2500)));

        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("clip_timeout = 2.5"));

        let unset: ExtractionConfig = toml::from_str("workers = 2").unwrap();
        assert_eq!(unset.clip_timeout, None);
        assert!(!toml::to_string(&unset).unwrap().contains("clip_timeout"));

        assert!(toml::from_str::<ExtractionConfig>("clip_timeout = -1.0").is_err());
    }
}
