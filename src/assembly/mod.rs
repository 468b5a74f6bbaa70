//! Training matrix assembly.
//!
//! Owns the feature-length × patch-count output matrix and drives the
//! per-clip pipeline that fills it:
//!
//! ```text
//! clip → volume → [anchor → patch → vector] × K → columns
//! ```

mod assembler;
mod matrix;

pub use assembler::{Assembler, Assembly, AssemblyError, ClipFailure, ClipRecord};
pub use matrix::{ColumnBlock, MatrixError, TrainingMatrix};
