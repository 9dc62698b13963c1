//! Ordered dithering with Bayer threshold matrices.
//!
//! The matrix is tiled over the image by `(y mod n, x mod n)` and each cell
//! is scaled to a threshold `cell * 255 / n²`. A pixel is white when its
//! luminance is strictly above the threshold. Nothing is propagated, so the
//! output depends only on position and the pixel itself.

use crate::buffer::{luminance, PixelBuffer};
use crate::error::DitherError;

use super::params::DitherParams;

/// Bayer 2x2 index matrix.
pub const BAYER_2X2: [[u8; 2]; 2] = [[0, 2], [3, 1]];

/// Bayer 4x4 index matrix.
pub const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Bayer 8x8 index matrix.
#[rustfmt::skip]
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [ 0, 32,  8, 40,  2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44,  4, 36, 14, 46,  6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [ 3, 35, 11, 43,  1, 33,  9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47,  7, 39, 13, 45,  5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Threshold every pixel with a per-position decision.
///
/// `decide(x, y, luminance)` returns `true` for white. The result honors
/// `invert` and has alpha forced to 255.
pub(crate) fn threshold_map<F>(
    buffer: &PixelBuffer,
    params: &DitherParams,
    mut decide: F,
) -> Result<PixelBuffer, DitherError>
where
    F: FnMut(usize, usize, f32) -> bool,
{
    let (w, h) = buffer.dimensions();
    let width = w as usize;
    let mut out = Vec::with_capacity(buffer.bytes().len());

    for (i, px) in buffer.bytes().chunks_exact(4).enumerate() {
        let lum = luminance(px[0] as f32, px[1] as f32, px[2] as f32);
        let byte = params.binary(decide(i % width, i / width, lum));
        out.extend_from_slice(&[byte, byte, byte, 255]);
    }

    PixelBuffer::new(w, h, out)
}

/// Ordered dither with an `N x N` Bayer matrix.
pub fn bayer<const N: usize>(
    buffer: &PixelBuffer,
    params: &DitherParams,
    matrix: &[[u8; N]; N],
) -> Result<PixelBuffer, DitherError> {
    let scale = 255.0 / (N * N) as f32;
    threshold_map(buffer, params, |x, y, lum| {
        lum > matrix[y % N][x % N] as f32 * scale
    })
}
