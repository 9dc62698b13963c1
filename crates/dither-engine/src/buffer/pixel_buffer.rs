//! The RGBA pixel buffer shared by every stage of the engine.

use crate::error::DitherError;
use crate::tiling::Tile;

use super::color::{luminance, Color};

/// An RGBA image: `width * height` pixels, four bytes each, row-major.
///
/// The byte length is validated once at construction and every operation in
/// the crate preserves it. Buffers are plain owned values: each stage takes
/// one by reference and returns a freshly allocated result, or mutates one it
/// exclusively owns.
///
/// # Example
///
/// ```
/// use dither_engine::PixelBuffer;
///
/// let buffer = PixelBuffer::filled(3, 2, [10, 20, 30, 255]);
/// assert_eq!(buffer.bytes().len(), 3 * 2 * 4);
/// assert_eq!(buffer.pixel(2, 1), [10, 20, 30, 255]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap RGBA bytes, checking `bytes.len() == width * height * 4`.
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, DitherError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(DitherError::BufferSize {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    /// A buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut bytes = Vec::with_capacity(count * 4);
        for _ in 0..count {
            bytes.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            bytes,
        }
    }

    /// An opaque grey buffer from one luminance byte per pixel.
    ///
    /// Returns an error if `values.len() != width * height`.
    pub fn from_luminance(width: u32, height: u32, values: &[u8]) -> Result<Self, DitherError> {
        let bytes = values.iter().flat_map(|&v| [v, v, v, 255]).collect();
        Self::new(width, height, bytes)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable RGBA bytes. The length cannot change through a slice.
    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Consume the buffer, returning its bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// RGBA value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ]
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.bytes[i..i + 4].copy_from_slice(&rgba);
    }

    /// RGB of the pixel at `(x, y)`, alpha dropped.
    #[inline]
    pub fn color(&self, x: u32, y: u32) -> Color {
        let [r, g, b, _] = self.pixel(x, y);
        Color::new(r, g, b)
    }

    /// Rec. 601 luminance of every pixel, row-major.
    pub fn luminance_plane(&self) -> Vec<f32> {
        self.bytes
            .chunks_exact(4)
            .map(|p| luminance(p[0] as f32, p[1] as f32, p[2] as f32))
            .collect()
    }

    /// Copy the region covered by `tile` into a standalone buffer.
    ///
    /// # Panics
    ///
    /// Panics if the tile extends past the buffer edge. Tiles produced by a
    /// [`TilePlan`](crate::TilePlan) for this buffer's dimensions never do.
    pub fn crop(&self, tile: &Tile) -> PixelBuffer {
        assert!(
            tile.x + tile.width <= self.width && tile.y + tile.height <= self.height,
            "tile {}x{}+{}+{} outside {}x{} buffer",
            tile.width,
            tile.height,
            tile.x,
            tile.y,
            self.width,
            self.height
        );
        let row_len = tile.width as usize * 4;
        let mut bytes = Vec::with_capacity(row_len * tile.height as usize);
        for row in tile.y..tile.y + tile.height {
            let start = self.offset(tile.x, row);
            bytes.extend_from_slice(&self.bytes[start..start + row_len]);
        }
        PixelBuffer {
            width: tile.width,
            height: tile.height,
            bytes,
        }
    }

    /// Write `source` into this buffer at the tile's offset.
    ///
    /// Returns [`DitherError::TileMismatch`] if `source` is not exactly the
    /// tile's size.
    pub fn blit(&mut self, tile: &Tile, source: &PixelBuffer) -> Result<(), DitherError> {
        if source.dimensions() != (tile.width, tile.height) {
            return Err(DitherError::TileMismatch {
                index: tile.index,
                width: tile.width,
                height: tile.height,
                actual_width: source.width,
                actual_height: source.height,
            });
        }
        let row_len = tile.width as usize * 4;
        for row in 0..tile.height {
            let dst = self.offset(tile.x, tile.y + row);
            let src = row as usize * row_len;
            self.bytes[dst..dst + row_len].copy_from_slice(&source.bytes[src..src + row_len]);
        }
        Ok(())
    }
}
