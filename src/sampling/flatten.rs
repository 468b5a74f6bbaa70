//! Patch linearization into feature vectors.

use super::Patch;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Element order used within each temporal slice.
///
/// Slices are always concatenated in time order. A row is a fixed
/// `x`; row-major walks `y` fastest, column-major walks `x` fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Packing {
    /// Each row contiguous.
    RowMajor,
    /// Each column contiguous.
    #[default]
    ColumnMajor,
}

/// Flattens a patch into a feature vector of length `slices × s²`.
pub fn flatten(patch: &Patch, packing: Packing) -> Array1<f64> {
    let mut out = Vec::with_capacity(patch.len());
    for slice in patch.iter_slices() {
        match packing {
            Packing::RowMajor => out.extend(slice.iter().copied()),
            Packing::ColumnMajor => out.extend(slice.t().iter().copied()),
        }
    }
    Array1::from(out)
}
