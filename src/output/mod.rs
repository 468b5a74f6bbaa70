//! Matrix and manifest output.
//!
//! The training matrix is handed to an external learner as a file;
//! the manifest records which clip each column came from.

mod manifest;
mod writer;

pub use manifest::Manifest;
pub use writer::{read_binary, write_matrix, MatrixFormat};

use crate::assembly::MatrixError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to write matrix: {0}")]
    Matrix(#[from] MatrixError),
    #[error("not a patchvol matrix file: {0}")]
    BadHeader(PathBuf),
    #[error("manifest error: {0}")]
    Manifest(String),
}
