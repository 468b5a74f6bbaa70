//! Clips stored as a directory of still frames.
//!
//! External decoders (ffmpeg and friends) dump a clip as numbered
//! images. Each image is one frame; frames are ordered by file name.

use super::{ClipLoader, Frame, FrameSource, SourceError};
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// A clip backed by a sorted list of image files.
#[derive(Debug)]
pub struct ImageSequence {
    frames: Vec<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequence {
    /// Opens the frame directory at `dir`.
    ///
    /// Dimensions are read from the first frame's header; every later
    /// frame must match them.
    pub fn open(dir: &Path) -> Result<Self, SourceError> {
        if !dir.exists() {
            return Err(SourceError::NotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(SourceError::Unsupported {
                path: dir.to_path_buf(),
                reason: "expected a directory of frame images; decode the video first".into(),
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut frames = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_frame_image(&path) {
                frames.push(path);
            }
        }
        frames.sort();

        let (width, height) = match frames.first() {
            Some(first) => image::image_dimensions(first).map_err(|source| SourceError::Decode {
                path: first.clone(),
                source,
            })?,
            None => (0, 0),
        };

        tracing::debug!(
            clip = %dir.display(),
            frames = frames.len(),
            width,
            height,
            "Opened image sequence"
        );

        Ok(Self {
            frames,
            width,
            height,
        })
    }
}

fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&mut self, index: usize) -> Result<Frame, SourceError> {
        let path = self.frames.get(index).ok_or(SourceError::FrameIndex {
            index,
            count: self.frames.len(),
        })?;

        let rgb = image::open(path)
            .map_err(|source| SourceError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();

        let (got_width, got_height) = rgb.dimensions();
        if (got_width, got_height) != (self.width, self.height) {
            return Err(SourceError::SizeMismatch {
                index,
                width: self.width,
                height: self.height,
                got_width,
                got_height,
            });
        }

        tracing::trace!(frame = index, path = %path.display(), "Decoded frame");
        Ok(Frame::new(rgb.into_raw(), got_width, got_height, index))
    }
}

/// Loader for image-sequence clips.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageSequenceLoader;

impl ClipLoader for ImageSequenceLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource + Send>, SourceError> {
        Ok(Box::new(ImageSequence::open(path)?))
    }
}
