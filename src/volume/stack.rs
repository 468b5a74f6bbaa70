//! The 3D intensity volume of one clip.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

/// A stack of intensity grids sharing the same cropped size.
///
/// Stored with shape `(depth, width, height)` and indexed `[t, x, y]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f64>,
}

impl Volume {
    /// Wraps an existing `(depth, width, height)` array.
    pub fn from_array(data: Array3<f64>) -> Self {
        Self { data }
    }

    /// Builds a volume by evaluating `f(x, y, t)` at every voxel.
    pub fn from_fn(
        width: usize,
        height: usize,
        depth: usize,
        f: impl Fn(usize, usize, usize) -> f64,
    ) -> Self {
        Self {
            data: Array3::from_shape_fn((depth, width, height), |(t, x, y)| f(x, y, t)),
        }
    }

    /// Stacks grids of identical shape in time order.
    ///
    /// Returns `None` if the grids do not share a shape.
    pub fn from_grids(grids: &[Array2<f64>]) -> Option<Self> {
        let views: Vec<ArrayView2<'_, f64>> = grids.iter().map(|g| g.view()).collect();
        ndarray::stack(Axis(0), &views).ok().map(Self::from_array)
    }

    /// Cropped width (x extent).
    #[inline]
    pub fn width(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Cropped height (y extent).
    #[inline]
    pub fn height(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Number of frames (t extent).
    #[inline]
    pub fn depth(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Returns the intensity at `(x, y, t)`, or `None` outside the volume.
    #[inline]
    pub fn get(&self, x: usize, y: usize, t: usize) -> Option<f64> {
        self.data.get([t, x, y]).copied()
    }

    /// Returns the grid for frame `t`.
    pub fn grid(&self, t: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), t)
    }

    /// Returns a view of the whole volume.
    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }
}
