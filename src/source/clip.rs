//! Frame source abstraction for decoded clips.
//!
//! Decoding video containers is left to external tools. This module
//! defines the seam the pipeline consumes frames through, along with
//! a synthetic source for testing.

use super::Frame;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while opening or reading a clip.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("clip not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported clip {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
    #[error("frame index {index} out of range for clip with {count} frames")]
    FrameIndex { index: usize, count: usize },
    #[error("frame {index} is {got_width}x{got_height}, clip is {width}x{height}")]
    SizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An opened clip: an ordered, finite sequence of frames.
///
/// Frame count and dimensions are known before any frame is read.
pub trait FrameSource {
    /// Returns the frame width and height shared by every frame.
    fn dimensions(&self) -> (u32, u32);

    /// Returns the number of frames in the clip.
    fn frame_count(&self) -> usize;

    /// Reads the frame at `index`.
    fn frame(&mut self, index: usize) -> Result<Frame, SourceError>;
}

/// Opens clips by path.
///
/// Loaders are shared across worker threads, so they must be `Sync`
/// and hand out `Send` sources.
pub trait ClipLoader: Sync {
    /// Opens the clip stored at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource + Send>, SourceError>;
}

/// Pixel pattern produced by a [`SyntheticClip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticPattern {
    /// Every pixel of every frame has the same gray value.
    Constant(u8),
    /// Gray value `(x + 3y + 7t) mod 256`.
    Gradient,
    /// Per-channel pattern with distinct R, G and B values.
    Color,
}

/// Shape and content of a synthetic clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticSpec {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of frames.
    pub frames: usize,
    /// Pixel pattern.
    pub pattern: SyntheticPattern,
}

impl SyntheticSpec {
    /// Creates a gradient clip of the given shape.
    pub fn gradient(width: u32, height: u32, frames: usize) -> Self {
        Self {
            width,
            height,
            frames,
            pattern: SyntheticPattern::Gradient,
        }
    }

    /// Creates a constant clip of the given shape.
    pub fn constant(width: u32, height: u32, frames: usize, value: u8) -> Self {
        Self {
            width,
            height,
            frames,
            pattern: SyntheticPattern::Constant(value),
        }
    }
}

/// Synthetic clip that generates deterministic frames on demand.
///
/// Used for tests and the demo mode. NOT a decoder.
#[derive(Debug, Clone)]
pub struct SyntheticClip {
    spec: SyntheticSpec,
}

impl SyntheticClip {
    /// Creates a clip from its spec.
    pub fn new(spec: SyntheticSpec) -> Self {
        Self { spec }
    }

    fn pixel(&self, x: u32, y: u32, t: usize) -> [u8; 3] {
        match self.spec.pattern {
            SyntheticPattern::Constant(v) => [v, v, v],
            SyntheticPattern::Gradient => {
                let v = ((x as usize + 3 * y as usize + 7 * t) % 256) as u8;
                [v, v, v]
            }
            SyntheticPattern::Color => [
                ((x as usize * 5 + t) % 256) as u8,
                ((y as usize * 11 + t) % 256) as u8,
                ((x as usize + y as usize + 13 * t) % 256) as u8,
            ],
        }
    }
}

impl FrameSource for SyntheticClip {
    fn dimensions(&self) -> (u32, u32) {
        (self.spec.width, self.spec.height)
    }

    fn frame_count(&self) -> usize {
        self.spec.frames
    }

    fn frame(&mut self, index: usize) -> Result<Frame, SourceError> {
        if index >= self.spec.frames {
            return Err(SourceError::FrameIndex {
                index,
                count: self.spec.frames,
            });
        }

        let (width, height) = self.dimensions();
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&self.pixel(x, y, index));
            }
        }
        Ok(Frame::new(pixels, width, height, index))
    }
}

/// Loader that serves synthetic clips.
///
/// Paths registered with [`SyntheticLoader::with_clip`] get their own
/// spec; any other path gets the default spec.
#[derive(Debug, Clone)]
pub struct SyntheticLoader {
    default: SyntheticSpec,
    clips: HashMap<PathBuf, SyntheticSpec>,
}

impl SyntheticLoader {
    /// Creates a loader serving `default` for every path.
    pub fn new(default: SyntheticSpec) -> Self {
        Self {
            default,
            clips: HashMap::new(),
        }
    }

    /// Registers a spec for a specific path.
    pub fn with_clip(mut self, path: impl Into<PathBuf>, spec: SyntheticSpec) -> Self {
        self.clips.insert(path.into(), spec);
        self
    }
}

impl ClipLoader for SyntheticLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource + Send>, SourceError> {
        let spec = self.clips.get(path).copied().unwrap_or(self.default);
        tracing::debug!(clip = %path.display(), ?spec, "Opened synthetic clip");
        Ok(Box::new(SyntheticClip::new(spec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_clip_frames() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(8, 6, 3));

        assert_eq!(clip.dimensions(), (8, 6));
        assert_eq!(clip.frame_count(), 3);

        let frame = clip.frame(2).unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.index(), 2);
        // x=1, y=2, t=2 -> 1 + 6 + 14
        assert_eq!(frame.rgb(1, 2), [21, 21, 21]);
    }

    #[test]
    fn test_synthetic_clip_index_out_of_range() {
        let mut clip = SyntheticClip::new(SyntheticSpec::constant(4, 4, 2, 9));
        assert!(matches!(
            clip.frame(2),
            Err(SourceError::FrameIndex { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_loader_per_path_specs() {
        let loader = SyntheticLoader::new(SyntheticSpec::gradient(16, 16, 4))
            .with_clip("small", SyntheticSpec::constant(4, 4, 1, 0));

        let small = loader.open(Path::new("small")).unwrap();
        assert_eq!(small.dimensions(), (4, 4));
        assert_eq!(small.frame_count(), 1);

        let other = loader.open(Path::new("anything")).unwrap();
        assert_eq!(other.dimensions(), (16, 16));
        assert_eq!(other.frame_count(), 4);
    }
}
