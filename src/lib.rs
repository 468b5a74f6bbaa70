//! Spatio-temporal Patch Feature Library
//!
//! Builds unsupervised training data for action recognition by sampling
//! random 3-D patches from video clips and packing each patch into one
//! column of a training matrix.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! source → volume → sampling → assembly → output
//!   ↓                              ↓
//!   selection                   metrics
//! ```
//!
//! - [`source`] decodes clips into RGB frames
//! - [`volume`] converts frames to luminance in [0, 1] and stacks them
//! - [`sampling`] draws anchors, copies patches and flattens them
//! - [`assembly`] lays every clip's patches out as matrix columns
//! - [`output`] writes the matrix and a manifest for the learner
//!
//! # Example
//!
//! ```no_run
//! use patchvol::{
//!     assembly::Assembler,
//!     config::ExtractionConfig,
//!     output::{write_matrix, MatrixFormat},
//!     source::{ClipSelection, ImageSequenceLoader},
//! };
//! use std::path::Path;
//!
//! let clips = ClipSelection::Prefix("actioncliptrain".into())
//!     .resolve(Path::new("data/kth"))
//!     .unwrap();
//!
//! let config = ExtractionConfig::new(16, 10, 100);
//! let assembly = Assembler::new(&ImageSequenceLoader, config)
//!     .assemble(&clips)
//!     .unwrap();
//!
//! write_matrix(&assembly.matrix, Path::new("features.csv"), MatrixFormat::Csv).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod assembly;
pub mod config;
pub mod metrics;
pub mod output;
pub mod sampling;
pub mod source;
pub mod volume;

// Re-export commonly used types at crate root
pub use assembly::{Assembler, Assembly, AssemblyError, TrainingMatrix};
pub use config::{ClipPolicy, ExtractionConfig, FileConfig};
pub use sampling::{Anchor, MarginPolicy, Packing, Patch, PatchSampler, PatchSize};
pub use source::{ClipLoader, ClipSelection, Frame, FrameSource, ImageSequenceLoader};
pub use volume::{Volume, VolumeBuilder};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
