//! Run configuration.
//!
//! [`ExtractionConfig`] carries the patch shape and sampling policy;
//! [`FileConfig`] adds clip selection and output settings loaded from
//! TOML.

mod extraction;
mod file;

pub use extraction::{ClipPolicy, ExtractionConfig};
pub use file::{ClipsConfig, FileConfig, OutputConfig};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("spatial size must be positive")]
    InvalidSpatialSize,
    #[error("temporal size must be positive")]
    InvalidTemporalSize,
    #[error("patch count must be positive")]
    InvalidPatchCount,
    #[error("worker count must be positive")]
    InvalidWorkers,
    #[error("clip timeout must be positive")]
    InvalidTimeout,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
