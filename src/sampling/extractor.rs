//! Sub-volume extraction at an anchor.

use super::{Anchor, PatchSize, SamplingError};
use crate::volume::Volume;
use ndarray::{s, Array3, ArrayView2, Axis};

/// A spatio-temporal block copied out of a volume.
///
/// Shape `(temporal, spatial, spatial)`, indexed `[t, x, y]` relative
/// to the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    anchor: Anchor,
    data: Array3<f64>,
}

impl Patch {
    /// Anchor the patch was taken from.
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Number of temporal slices.
    #[inline]
    pub fn slices(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Edge length of each slice.
    #[inline]
    pub fn spatial_size(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Total element count.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the patch holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the `k`-th temporal slice, indexed `[x, y]`.
    pub fn slice(&self, k: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), k)
    }

    /// Iterates over the temporal slices in order.
    pub fn iter_slices(&self) -> impl Iterator<Item = ArrayView2<'_, f64>> {
        self.data.outer_iter()
    }
}

/// Copies `[x, x+s) × [y, y+s) × [t, t+T)` out of `volume`.
pub fn extract(volume: &Volume, anchor: Anchor, size: PatchSize) -> Result<Patch, SamplingError> {
    let fits = anchor.x + size.spatial <= volume.width()
        && anchor.y + size.spatial <= volume.height()
        && anchor.t + size.temporal <= volume.depth();
    if !fits {
        return Err(SamplingError::OutOfBounds {
            anchor,
            width: volume.width(),
            height: volume.height(),
            depth: volume.depth(),
        });
    }

    let view = volume.view();
    let block = view.slice(s![
        anchor.t..anchor.t + size.temporal,
        anchor.x..anchor.x + size.spatial,
        anchor.y..anchor.y + size.spatial
    ]);

    Ok(Patch {
        anchor,
        data: block.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded_volume() -> Volume {
        Volume::from_fn(8, 6, 5, |x, y, t| (x + 10 * y + 100 * t) as f64)
    }

    #[test]
    fn test_extract_copies_block() {
        let volume = coded_volume();
        let patch = extract(&volume, Anchor::new(2, 3, 1), PatchSize::new(3, 2)).unwrap();

        assert_eq!(patch.slices(), 2);
        assert_eq!(patch.spatial_size(), 3);
        assert_eq!(patch.len(), 18);
        assert_eq!(patch.slice(0)[[0, 0]], 132.0);
        assert_eq!(patch.slice(1)[[2, 2]], 254.0);
    }

    #[test]
    fn test_extract_at_far_corner() {
        let volume = coded_volume();
        let patch = extract(&volume, Anchor::new(6, 4, 3), PatchSize::new(2, 2)).unwrap();
        assert_eq!(patch.slice(1)[[1, 1]], 457.0);
    }

    #[test]
    fn test_extract_out_of_bounds() {
        let volume = coded_volume();
        for anchor in [
            Anchor::new(7, 0, 0),
            Anchor::new(0, 5, 0),
            Anchor::new(0, 0, 4),
        ] {
            assert!(matches!(
                extract(&volume, anchor, PatchSize::new(2, 2)),
                Err(SamplingError::OutOfBounds { .. })
            ));
        }
    }
}
