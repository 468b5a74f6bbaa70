//! Clip input and frame handling.
//!
//! This module provides the seam through which decoded frames enter
//! the pipeline. Container and codec parsing happen outside this crate;
//! a clip arrives here as an ordered sequence of RGB frames.

mod clip;
mod deadline;
mod frame;
mod images;
mod selection;

pub use clip::{
    ClipLoader, FrameSource, SourceError, SyntheticClip, SyntheticLoader, SyntheticPattern,
    SyntheticSpec,
};
pub use deadline::ClipDeadline;
pub use frame::Frame;
pub use images::{ImageSequence, ImageSequenceLoader};
pub use selection::ClipSelection;
