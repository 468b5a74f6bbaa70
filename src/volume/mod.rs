//! Intensity volumes built from decoded clips.
//!
//! Frames are converted to BT.709 luminance, scaled into [0, 1] and
//! stacked along time into a `(t, x, y)` volume.

mod builder;
pub mod grayscale;
mod stack;

pub use builder::{crop_bound, VolumeBuilder, VolumeError};
pub use stack::Volume;
