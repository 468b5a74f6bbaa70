//! Random anchor selection for patches.
//!
//! Anchors are drawn uniformly inside a window that keeps every patch
//! `margin` pixels away from the spatial edges and starts no earlier
//! than the second frame. With the growing policy, the margin is
//! incremented before every draw, so successive patches of one clip
//! see strictly increasing margins.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Initial margin of the growing policy.
pub const DEFAULT_INITIAL_MARGIN: usize = 5;

/// First frame an anchor may start at.
pub const MIN_ANCHOR_T: usize = 1;

/// Spatial and temporal extent of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSize {
    /// Edge length in x and y.
    pub spatial: usize,
    /// Number of frames.
    pub temporal: usize,
}

impl PatchSize {
    /// Creates a patch size.
    pub fn new(spatial: usize, temporal: usize) -> Self {
        Self { spatial, temporal }
    }

    /// Length of a flattened patch: `spatial² × temporal`.
    #[inline]
    pub fn feature_len(&self) -> usize {
        self.spatial * self.spatial * self.temporal
    }
}

/// Lower corner of a patch inside a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    /// Row offset in the cropped grid (first spatial axis).
    pub x: usize,
    /// Column offset in the cropped grid (second spatial axis).
    pub y: usize,
    /// First frame of the patch.
    pub t: usize,
}

impl Anchor {
    /// Creates an anchor.
    pub fn new(x: usize, y: usize, t: usize) -> Self {
        Self { x, y, t }
    }
}

/// How the spatial margin evolves across the draws of one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MarginPolicy {
    /// Starts at `initial` and grows by one before each draw.
    Growing { initial: usize },
    /// Same margin for every draw.
    Fixed { margin: usize },
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self::Growing {
            initial: DEFAULT_INITIAL_MARGIN,
        }
    }
}

impl MarginPolicy {
    /// Margin used for the `draw`-th patch of a clip (0-based).
    #[inline]
    pub fn margin_for(&self, draw: usize) -> usize {
        match *self {
            Self::Growing { initial } => initial + draw + 1,
            Self::Fixed { margin } => margin,
        }
    }
}

/// Volume axis along which sampling failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleAxis {
    X,
    Y,
    T,
}

impl std::fmt::Display for SampleAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::T => "t",
        })
    }
}

/// Errors that can occur while sampling or extracting patches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SamplingError {
    #[error(
        "no room on {axis} axis (range [{lower}, {upper}) at margin {margin})"
    )]
    InfeasibleSampling {
        patch: usize,
        axis: SampleAxis,
        lower: i64,
        upper: i64,
        margin: usize,
    },
    #[error("patch at {anchor:?} exceeds volume {width}x{height}x{depth}")]
    OutOfBounds {
        anchor: Anchor,
        width: usize,
        height: usize,
        depth: usize,
    },
}

/// Half-open sampling range `[lower, upper)`, failing if empty.
fn range(
    patch: usize,
    axis: SampleAxis,
    lower: usize,
    extent: usize,
    margin: usize,
    size: usize,
) -> Result<std::ops::Range<usize>, SamplingError> {
    let lower = lower as i64;
    let upper = extent as i64 - margin as i64 - size as i64 + 1;
    if upper <= lower {
        return Err(SamplingError::InfeasibleSampling {
            patch,
            axis,
            lower,
            upper,
            margin,
        });
    }
    Ok(lower as usize..upper as usize)
}

/// Draws patch anchors for a volume of known dimensions.
#[derive(Debug, Clone, Copy)]
pub struct PatchSampler {
    size: PatchSize,
    margin: MarginPolicy,
}

impl PatchSampler {
    /// Creates a sampler for the given patch size and margin policy.
    pub fn new(size: PatchSize, margin: MarginPolicy) -> Self {
        Self { size, margin }
    }

    /// Returns the patch size.
    pub fn size(&self) -> PatchSize {
        self.size
    }

    /// Draws the anchor for the `draw`-th patch of a clip.
    pub fn draw<R: Rng>(
        &self,
        (width, height, depth): (usize, usize, usize),
        draw: usize,
        rng: &mut R,
    ) -> Result<Anchor, SamplingError> {
        let margin = self.margin.margin_for(draw);
        let spatial = self.size.spatial;

        let xs = range(draw, SampleAxis::X, margin, width, margin, spatial)?;
        let ys = range(draw, SampleAxis::Y, margin, height, margin, spatial)?;
        // The temporal window has no margin term.
        let ts = range(draw, SampleAxis::T, MIN_ANCHOR_T, depth, 0, self.size.temporal)?;

        let anchor = Anchor::new(rng.gen_range(xs), rng.gen_range(ys), rng.gen_range(ts));
        tracing::trace!(draw, margin, ?anchor, "Drew anchor");
        Ok(anchor)
    }

    /// Draws `count` anchors in order.
    pub fn sample<R: Rng>(
        &self,
        dims: (usize, usize, usize),
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Anchor>, SamplingError> {
        (0..count).map(|draw| self.draw(dims, draw, rng)).collect()
    }
}
