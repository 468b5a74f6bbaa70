//! Patch sampling, extraction and flattening.
//!
//! For each clip, anchors are drawn under a spatial margin and a
//! temporal bound, the sub-volume at each anchor is copied out, and
//! the copy is linearized into a fixed-length feature vector.

mod extractor;
mod flatten;
mod rng;
mod sampler;

pub use extractor::{extract, Patch};
pub use flatten::{flatten, Packing};
pub use rng::ClipSeeds;
pub use sampler::{
    Anchor, MarginPolicy, PatchSampler, PatchSize, SampleAxis, SamplingError,
    DEFAULT_INITIAL_MARGIN, MIN_ANCHOR_T,
};
