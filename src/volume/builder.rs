//! Volume construction from a clip's frames.
//!
//! Every frame is normalized to intensities and cropped to the largest
//! multiple of the patch spatial size that fits, so all grids of a clip
//! share one shape.

use super::{grayscale, Volume};
use crate::source::{ClipDeadline, Frame, FrameSource, SourceError};
use ndarray::{s, Array3, Axis};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while building a volume.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("clip has no frames")]
    EmptyClip,
    #[error("spatial size must be positive")]
    ZeroSpatialSize,
    #[error("cropped frame {width}x{height} smaller than spatial size {spatial_size}")]
    DimensionTooSmall {
        width: usize,
        height: usize,
        spatial_size: usize,
    },
    #[error("frame {index} is {got_width}x{got_height}, expected {width}x{height}")]
    InconsistentFrameSize {
        index: usize,
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
    #[error("invalid frame {index}: pixel buffer does not match dimensions")]
    InvalidFrame { index: usize },
    #[error("timed out after {elapsed:?} at frame {frame} (limit {limit:?})")]
    Timeout {
        frame: usize,
        elapsed: Duration,
        limit: Duration,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Largest multiple of `spatial_size` not exceeding `extent`; 0 when
/// `spatial_size` is 0.
#[inline]
pub fn crop_bound(extent: usize, spatial_size: usize) -> usize {
    extent
        .checked_div(spatial_size)
        .map_or(0, |blocks| blocks * spatial_size)
}

/// Builds intensity volumes for a fixed spatial patch size.
#[derive(Debug, Clone, Copy)]
pub struct VolumeBuilder {
    spatial_size: usize,
    deadline: Option<ClipDeadline>,
}

impl VolumeBuilder {
    /// Creates a builder for patches of edge `spatial_size`.
    ///
    /// A zero size is rejected with [`VolumeError::ZeroSpatialSize`]
    /// when a volume is built.
    pub fn new(spatial_size: usize) -> Self {
        Self {
            spatial_size,
            deadline: None,
        }
    }

    /// Fails [`load`](Self::load) once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Option<ClipDeadline>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the cropped `(width, height)` for a frame of the given size.
    pub fn cropped_dimensions(&self, width: u32, height: u32) -> (usize, usize) {
        (
            crop_bound(width as usize, self.spatial_size),
            crop_bound(height as usize, self.spatial_size),
        )
    }

    /// Reads every frame of `source` in order and builds its volume.
    pub fn load(&self, source: &mut dyn FrameSource) -> Result<Volume, VolumeError> {
        let count = source.frame_count();
        let (width, height) = source.dimensions();
        let mut stack = self.allocate(count, width, height)?;

        for index in 0..count {
            if let Some(deadline) = self.deadline {
                if let Some(elapsed) = deadline.expired() {
                    return Err(VolumeError::Timeout {
                        frame: index,
                        elapsed,
                        limit: deadline.limit(),
                    });
                }
            }
            let frame = source.frame(index)?;
            self.write_frame(&mut stack, index, &frame, width, height)?;
        }

        tracing::debug!(
            frames = count,
            width = stack.len_of(Axis(1)),
            height = stack.len_of(Axis(2)),
            "Built volume"
        );
        Ok(Volume::from_array(stack))
    }

    /// Builds a volume from an in-memory frame sequence.
    ///
    /// The first frame fixes the expected dimensions.
    pub fn build(&self, frames: &[Frame]) -> Result<Volume, VolumeError> {
        let first = frames.first().ok_or(VolumeError::EmptyClip)?;
        let (width, height) = (first.width(), first.height());
        let mut stack = self.allocate(frames.len(), width, height)?;

        for (index, frame) in frames.iter().enumerate() {
            self.write_frame(&mut stack, index, frame, width, height)?;
        }
        Ok(Volume::from_array(stack))
    }

    fn allocate(&self, count: usize, width: u32, height: u32) -> Result<Array3<f64>, VolumeError> {
        if self.spatial_size == 0 {
            return Err(VolumeError::ZeroSpatialSize);
        }
        if count == 0 {
            return Err(VolumeError::EmptyClip);
        }

        let (cw, ch) = self.cropped_dimensions(width, height);
        if cw < self.spatial_size || ch < self.spatial_size {
            return Err(VolumeError::DimensionTooSmall {
                width: cw,
                height: ch,
                spatial_size: self.spatial_size,
            });
        }

        Ok(Array3::zeros((count, cw, ch)))
    }

    fn write_frame(
        &self,
        stack: &mut Array3<f64>,
        index: usize,
        frame: &Frame,
        width: u32,
        height: u32,
    ) -> Result<(), VolumeError> {
        if (frame.width(), frame.height()) != (width, height) {
            return Err(VolumeError::InconsistentFrameSize {
                index,
                width,
                height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }
        if !frame.is_valid() {
            return Err(VolumeError::InvalidFrame { index });
        }

        let grid = grayscale::normalize(frame);
        let (cw, ch) = (stack.len_of(Axis(1)), stack.len_of(Axis(2)));
        stack
            .index_axis_mut(Axis(0), index)
            .assign(&grid.slice(s![..cw, ..ch]));

        tracing::trace!(frame = index, "Normalized frame");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SyntheticClip, SyntheticSpec};
    use proptest::prelude::*;

    #[test]
    fn test_crop_to_spatial_multiple() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(23, 17, 3));
        let volume = VolumeBuilder::new(5).load(&mut clip).unwrap();

        assert_eq!(volume.width(), 20);
        assert_eq!(volume.height(), 15);
        assert_eq!(volume.depth(), 3);
    }

    #[test]
    fn test_crop_keeps_origin() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(10, 10, 2));
        let volume = VolumeBuilder::new(4).load(&mut clip).unwrap();

        // Gradient: x + 3y + 7t
        let expected = (2 + 3 * 5 + 7) as f64 / 255.0;
        assert!((volume.get(2, 5, 1).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_clip_rejected() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(16, 16, 0));
        assert!(matches!(
            VolumeBuilder::new(4).load(&mut clip),
            Err(VolumeError::EmptyClip)
        ));
        assert!(matches!(
            VolumeBuilder::new(4).build(&[]),
            Err(VolumeError::EmptyClip)
        ));
    }

    #[test]
    fn test_too_small_rejected() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(16, 7, 4));
        assert!(matches!(
            VolumeBuilder::new(8).load(&mut clip),
            Err(VolumeError::DimensionTooSmall {
                width: 16,
                height: 0,
                spatial_size: 8
            })
        ));
    }

    #[test]
    fn test_inconsistent_frames_rejected() {
        let frames = vec![
            Frame::from_gray(&[0; 16], 4, 4, 0),
            Frame::from_gray(&[0; 20], 5, 4, 1),
        ];
        assert!(matches!(
            VolumeBuilder::new(2).build(&frames),
            Err(VolumeError::InconsistentFrameSize { index: 1, .. })
        ));
    }

    #[test]
    fn test_zero_spatial_size_rejected() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(8, 8, 2));
        assert!(matches!(
            VolumeBuilder::new(0).load(&mut clip),
            Err(VolumeError::ZeroSpatialSize)
        ));
        assert_eq!(VolumeBuilder::new(0).cropped_dimensions(8, 8), (0, 0));
        assert_eq!(crop_bound(17, 0), 0);
    }

    /// Sleeps before handing out each frame.
    struct SlowSource {
        inner: SyntheticClip,
        delay: Duration,
    }

    impl FrameSource for SlowSource {
        fn dimensions(&self) -> (u32, u32) {
            self.inner.dimensions()
        }

        fn frame_count(&self) -> usize {
            self.inner.frame_count()
        }

        fn frame(&mut self, index: usize) -> Result<Frame, SourceError> {
            std::thread::sleep(self.delay);
            self.inner.frame(index)
        }
    }

    #[test]
    fn test_deadline_stops_between_frames() {
        let mut source = SlowSource {
            inner: SyntheticClip::new(SyntheticSpec::gradient(8, 8, 50)),
            delay: Duration::from_millis(10),
        };
        let deadline = ClipDeadline::start(Duration::from_millis(30));

        match VolumeBuilder::new(4).with_deadline(Some(deadline)).load(&mut source) {
            Err(VolumeError::Timeout {
                frame,
                elapsed,
                limit,
            }) => {
                assert!(frame >= 1 && frame < 50);
                assert!(elapsed >= limit);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_generous_deadline_builds_volume() {
        let mut clip = SyntheticClip::new(SyntheticSpec::gradient(8, 8, 4));
        let deadline = ClipDeadline::start(Duration::from_secs(60));
        let volume = VolumeBuilder::new(4)
            .with_deadline(Some(deadline))
            .load(&mut clip)
            .unwrap();
        assert_eq!(volume.depth(), 4);
    }

    proptest! {
        #[test]
        fn prop_cropped_dims_are_largest_multiples(
            width in 1u32..200,
            height in 1u32..200,
            spatial in 1usize..32,
        ) {
            prop_assume!(spatial <= width.min(height) as usize);
            let (cw, ch) = VolumeBuilder::new(spatial).cropped_dimensions(width, height);

            prop_assert_eq!(cw % spatial, 0);
            prop_assert_eq!(ch % spatial, 0);
            prop_assert!(cw <= width as usize && width as usize - cw < spatial);
            prop_assert!(ch <= height as usize && height as usize - ch < spatial);
            prop_assert!(cw >= spatial && ch >= spatial);
        }
    }
}
