//! Frame type representing one decoded RGB image of a clip.

/// A single decoded frame from a clip.
///
/// Pixels are stored as packed RGB triples in row-major order
/// (`y * width + x`), three bytes per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Packed RGB pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Position of the frame within its clip.
    index: usize,
}

impl Frame {
    /// Creates a new frame from packed RGB data.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        Self {
            pixels,
            width,
            height,
            index,
        }
    }

    /// Creates a frame where every channel of a pixel holds the same value.
    pub fn from_gray(values: &[u8], width: u32, height: u32, index: usize) -> Self {
        let pixels = values.iter().flat_map(|&v| [v, v, v]).collect();
        Self::new(pixels, width, height, index)
    }

    /// Returns a reference to the packed RGB data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the frame's position in its clip.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns the RGB triple at `(x, y)`.
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ]
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * 3
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("index", &self.index)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 64 * 48 * 3];
        let frame = Frame::new(pixels, 64, 48, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.index(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 100]; // Wrong size
        let frame = Frame::new(pixels, 64, 48, 1);

        assert!(!frame.is_valid());
    }

    #[test]
    fn test_rgb_lookup_is_row_major() {
        let mut pixels = vec![0u8; 4 * 2 * 3];
        // Pixel (x=1, y=1) in a 4-wide frame
        let offset = (4 + 1) * 3;
        pixels[offset..offset + 3].copy_from_slice(&[10, 20, 30]);
        let frame = Frame::new(pixels, 4, 2, 0);

        assert_eq!(frame.rgb(1, 1), [10, 20, 30]);
        assert_eq!(frame.rgb(1, 0), [0, 0, 0]);
    }

    #[test]
    fn test_from_gray_replicates_channels() {
        let frame = Frame::from_gray(&[7, 9], 2, 1, 0);
        assert_eq!(frame.pixels(), &[7, 7, 7, 9, 9, 9]);
        assert!(frame.is_valid());
    }
}
