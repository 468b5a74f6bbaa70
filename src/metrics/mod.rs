//! Prometheus metrics for extraction runs.
//!
//! # Metrics Exposed
//!
//! - `patchvol_clips_processed_total` - Clips fully written to the matrix
//! - `patchvol_clips_skipped_total` - Clips dropped after a failure
//! - `patchvol_frames_decoded_total` - Frames read into volumes
//! - `patchvol_patches_extracted_total` - Patches flattened into columns
//! - `patchvol_matrix_columns_filled` - Columns currently written
//! - `patchvol_feature_length` - Matrix row count
//!
//! The registry can be encoded to the Prometheus text format and
//! written next to the output matrix.

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
