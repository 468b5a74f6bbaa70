//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("failed to write metrics: {0}")]
    Io(#[from] std::io::Error),
}

/// Prometheus metrics registry for an extraction run.
///
/// Counters are updated by the assembler as clips complete, from any
/// worker thread.
pub struct MetricsRegistry {
    registry: Registry,

    // Clip metrics
    clips_processed: IntCounter,
    clips_skipped: IntCounter,
    frames_decoded: IntCounter,

    // Patch metrics
    patches_extracted: IntCounter,
    columns_filled: IntGauge,
    feature_length: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all extraction metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let clips_processed = IntCounter::new(
            "patchvol_clips_processed_total",
            "Clips whose patches were all written to the matrix",
        )?;
        let clips_skipped = IntCounter::new(
            "patchvol_clips_skipped_total",
            "Clips dropped after a failure",
        )?;
        let frames_decoded = IntCounter::new(
            "patchvol_frames_decoded_total",
            "Frames read into intensity volumes",
        )?;
        let patches_extracted = IntCounter::new(
            "patchvol_patches_extracted_total",
            "Patches flattened into matrix columns",
        )?;
        let columns_filled = IntGauge::new(
            "patchvol_matrix_columns_filled",
            "Columns of the training matrix written so far",
        )?;
        let feature_length = IntGauge::new(
            "patchvol_feature_length",
            "Rows of the training matrix (spatial² × temporal)",
        )?;

        registry.register(Box::new(clips_processed.clone()))?;
        registry.register(Box::new(clips_skipped.clone()))?;
        registry.register(Box::new(frames_decoded.clone()))?;
        registry.register(Box::new(patches_extracted.clone()))?;
        registry.register(Box::new(columns_filled.clone()))?;
        registry.register(Box::new(feature_length.clone()))?;

        Ok(Self {
            registry,
            clips_processed,
            clips_skipped,
            frames_decoded,
            patches_extracted,
            columns_filled,
            feature_length,
        })
    }

    /// Records the matrix row count for this run.
    pub fn set_feature_length(&self, rows: usize) {
        self.feature_length.set(rows as i64);
    }

    /// Records a frame volume built for a clip.
    pub fn record_frames(&self, frames: usize) {
        self.frames_decoded.inc_by(frames as u64);
    }

    /// Records one patch written to the matrix.
    pub fn record_patch(&self) {
        self.patches_extracted.inc();
        self.columns_filled.inc();
    }

    /// Records a clip whose patches were all written.
    pub fn record_clip_done(&self) {
        self.clips_processed.inc();
    }

    /// Records a clip dropped after a failure.
    ///
    /// Any of its columns already written are discarded with it.
    pub fn record_clip_skipped(&self, written: usize) {
        self.clips_skipped.inc();
        self.columns_filled.sub(written as i64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes the text encoding to `path`.
    pub fn write_to(&self, path: &std::path::Path) -> Result<(), MetricsError> {
        std::fs::write(path, self.encode()?)?;
        Ok(())
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("clips_processed", &self.clips_processed.get())
            .field("clips_skipped", &self.clips_skipped.get())
            .field("patches_extracted", &self.patches_extracted.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        registry.set_feature_length(512);
        registry.record_frames(40);
        for _ in 0..3 {
            registry.record_patch();
        }
        registry.record_clip_done();
        registry.record_patch();
        registry.record_clip_skipped(1);

        let output = registry.encode().unwrap();
        assert!(output.contains("patchvol_feature_length 512"));
        assert!(output.contains("patchvol_frames_decoded_total 40"));
        assert!(output.contains("patchvol_patches_extracted_total 4"));
        assert!(output.contains("patchvol_matrix_columns_filled 3"));
        assert!(output.contains("patchvol_clips_processed_total 1"));
        assert!(output.contains("patchvol_clips_skipped_total 1"));
    }

    #[test]
    fn test_metrics_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.prom");

        let registry = MetricsRegistry::new().unwrap();
        registry.write_to(&path).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("patchvol_clips_processed_total"));
    }
}
