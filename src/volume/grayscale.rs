//! Grayscale conversion and intensity normalization.
//!
//! Luminance uses the ITU-R BT.709 weights. The per-pixel luma is
//! truncated to an integer, and the scale into [0, 1] is applied to
//! the whole grid afterwards.

use crate::source::Frame;
use ndarray::Array2;

/// BT.709 luma weights in units of 1/10000.
const LUMA_WEIGHTS: [u32; 3] = [2126, 7152, 722];
const LUMA_DENOM: u32 = 10_000;

/// Full-scale 8-bit intensity.
pub const INTENSITY_SCALE: f64 = 255.0;

/// Integer-truncated BT.709 luminance of one RGB triple.
///
/// Fixed-point so that a gray pixel (R = G = B = v) maps back to
/// exactly `v`.
#[inline]
pub fn luma([r, g, b]: [u8; 3]) -> u8 {
    let weighted =
        LUMA_WEIGHTS[0] * r as u32 + LUMA_WEIGHTS[1] * g as u32 + LUMA_WEIGHTS[2] * b as u32;
    (weighted / LUMA_DENOM) as u8
}

/// Converts a frame to grayscale while keeping three channels.
///
/// Every channel of the output holds the pixel's luma.
pub fn to_gray(frame: &Frame) -> Frame {
    let pixels = frame
        .pixels()
        .chunks_exact(3)
        .flat_map(|px| {
            let l = luma([px[0], px[1], px[2]]);
            [l, l, l]
        })
        .collect();
    Frame::new(pixels, frame.width(), frame.height(), frame.index())
}

/// Converts one frame into a normalized intensity grid.
///
/// The grid has shape `(width, height)` and is indexed `[x, y]`.
/// Values lie in [0, 1].
pub fn normalize(frame: &Frame) -> Array2<f64> {
    let shape = (frame.width() as usize, frame.height() as usize);
    let mut grid =
        Array2::from_shape_fn(shape, |(x, y)| luma(frame.rgb(x as u32, y as u32)) as f64);
    grid /= INTENSITY_SCALE;
    grid
}
