//! Error diffusion driven by a [`Kernel`].

use crate::buffer::{luminance, PixelBuffer};
use crate::error::DitherError;
use crate::palette::PaletteMapper;

use super::kernel::Kernel;
use super::params::DitherParams;

/// Sliding window of error rows.
///
/// Only the rows the kernel can reach are kept: `rows[0]` is the current row,
/// `rows[1]` the next one, and so on. Values are floats and are never clamped,
/// so rounding only happens once, when a pixel is written out.
#[derive(Debug)]
pub(crate) struct ErrorBuffer {
    rows: Vec<Vec<[f32; 3]>>,
    width: usize,
}

impl ErrorBuffer {
    /// `row_depth` is the kernel's `max_dy + 1`.
    pub(crate) fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth).map(|_| vec![[0.0; 3]; width]).collect(),
            width,
        }
    }

    #[inline]
    pub(crate) fn get_accumulated(&self, x: usize) -> [f32; 3] {
        self.rows[0][x]
    }

    /// Add error to a pixel `row_offset` rows below the current one.
    /// Out-of-bounds targets are ignored.
    #[inline]
    pub(crate) fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.rows.len() {
            for c in 0..3 {
                self.rows[row_offset][x][c] += error[c];
            }
        }
    }

    pub(crate) fn advance_row(&mut self) {
        // [0,1,2] -> [1,2,0], then clear the recycled row
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 3]);
        }
    }
}

/// Run error diffusion over `buffer` with `kernel`.
///
/// Without a palette each pixel's luminance plus accumulated error is
/// compared against the threshold (`< threshold` is black). With a palette
/// the per-channel RGB plus error is matched to the nearest entry. In both
/// cases the residual `original - chosen` is scaled by the strength and
/// spread over the kernel's neighbours; neighbours outside the buffer are
/// skipped.
pub fn diffuse(
    buffer: &PixelBuffer,
    kernel: &Kernel,
    params: &DitherParams,
) -> Result<PixelBuffer, DitherError> {
    let mapper = params
        .palette
        .as_deref()
        .map(PaletteMapper::new)
        .transpose()?;

    let (w, h) = buffer.dimensions();
    let (width, height) = (w as usize, h as usize);
    let threshold = params.threshold_value();
    let strength = params.strength_value();
    let divisor = kernel.divisor as f32;

    let src = buffer.bytes();
    let mut out = vec![0u8; src.len()];
    let mut errors = ErrorBuffer::new(width, kernel.max_dy + 1);

    for y in 0..height {
        let reverse = params.serpentine && y % 2 == 1;

        for step in 0..width {
            let x = if reverse { width - 1 - step } else { step };
            let i = (y * width + x) * 4;
            let acc = errors.get_accumulated(x);
            let (r, g, b) = (src[i] as f32, src[i + 1] as f32, src[i + 2] as f32);

            let residual = match &mapper {
                None => {
                    let value = luminance(r, g, b) + acc[0];
                    let white = value >= threshold;
                    let chosen = if white { 255.0 } else { 0.0 };
                    let byte = params.binary(white);
                    out[i..i + 3].fill(byte);
                    [(value - chosen) * strength, 0.0, 0.0]
                }
                Some(mapper) => {
                    let value = [r + acc[0], g + acc[1], b + acc[2]];
                    let (color, chosen) = mapper.nearest(value);
                    out[i..i + 3].copy_from_slice(&color.to_bytes());
                    [
                        (value[0] - chosen[0]) * strength,
                        (value[1] - chosen[1]) * strength,
                        (value[2] - chosen[2]) * strength,
                    ]
                }
            };
            out[i + 3] = 255;

            for &(dx, dy, weight) in kernel.entries.iter() {
                let dx = if reverse { -dx } else { dx };
                let nx = x as i64 + dx as i64;
                let ny = y + dy as usize;
                if nx < 0 || nx >= width as i64 || ny >= height {
                    continue;
                }
                let share = weight as f32 / divisor;
                errors.add_error(
                    nx as usize,
                    dy as usize,
                    [residual[0] * share, residual[1] * share, residual[2] * share],
                );
            }
        }

        errors.advance_row();
    }

    PixelBuffer::new(w, h, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Color;
    use crate::dither::kernel::{ATKINSON, FLOYD_STEINBERG};
    use crate::dither::DitherAlgorithm;

    fn params() -> DitherParams {
        DitherParams::new(DitherAlgorithm::FloydSteinberg)
    }

    fn mean_red(buffer: &PixelBuffer) -> f64 {
        let sum: f64 = buffer.bytes().chunks_exact(4).map(|p| p[0] as f64).sum();
        sum / buffer.pixel_count() as f64
    }

    #[test]
    fn test_error_buffer_rotates() {
        let mut buf = ErrorBuffer::new(3, 2);
        buf.add_error(1, 0, [1.0, 0.0, 0.0]);
        buf.add_error(2, 1, [0.0, 2.0, 0.0]);
        buf.add_error(3, 0, [9.0, 9.0, 9.0]);
        buf.add_error(0, 2, [9.0, 9.0, 9.0]);
        assert_eq!(buf.get_accumulated(1), [1.0, 0.0, 0.0]);

        buf.advance_row();
        assert_eq!(buf.get_accumulated(1), [0.0, 0.0, 0.0]);
        assert_eq!(buf.get_accumulated(2), [0.0, 2.0, 0.0]);

        buf.advance_row();
        assert_eq!(buf.get_accumulated(2), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_binary_output_is_black_or_white() {
        let buffer = PixelBuffer::from_luminance(4, 4, &[0u8, 60, 120, 180].repeat(4)).unwrap();
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        for px in out.bytes().chunks_exact(4) {
            assert!(px[0] == 0 || px[0] == 255);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_first_pixel_uses_threshold() {
        let buffer = PixelBuffer::from_luminance(1, 1, &[127]).unwrap();
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);

        let buffer = PixelBuffer::from_luminance(1, 1, &[128]).unwrap();
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_error_reaches_right_neighbour() {
        // 100 -> black, 7/16 of +100 lands on the next pixel: 120 + 43.75 >= 128
        let buffer = PixelBuffer::from_luminance(2, 1, &[100, 120]).unwrap();
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(1, 0)[0], 255);

        let none = params().strength(0.0);
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &none).unwrap();
        assert_eq!(out.pixel(1, 0)[0], 0, "zero strength is plain thresholding");
    }

    #[test]
    fn test_serpentine_reverses_odd_rows() {
        // Row 1 scanned right to left: the residual of (1, 1) flows to (0, 1)
        let buffer = PixelBuffer::from_luminance(2, 2, &[255, 255, 100, 120]).unwrap();
        let snake = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        assert_eq!(snake.pixel(1, 1)[0], 0);
        assert_eq!(snake.pixel(0, 1)[0], 255);

        let raster = diffuse(&buffer, &FLOYD_STEINBERG, &params().serpentine(false)).unwrap();
        assert_eq!(raster.pixel(0, 1)[0], 0);
        assert_eq!(raster.pixel(1, 1)[0], 255);
    }

    #[test]
    fn test_invert_flips_output() {
        let buffer = PixelBuffer::from_luminance(2, 1, &[10, 250]).unwrap();
        let out = diffuse(&buffer, &ATKINSON, &params().invert(true)).unwrap();
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(out.pixel(1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_palette_mode_uses_palette_colors() {
        let palette = vec![Color::BLACK, Color::new(255, 0, 0), Color::WHITE];
        let mut buffer = PixelBuffer::filled(6, 6, [200, 40, 40, 128]);
        buffer.set_pixel(0, 0, [250, 250, 250, 255]);
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params().palette(palette.clone())).unwrap();

        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
        for y in 0..6 {
            for x in 0..6 {
                let px = out.pixel(x, y);
                assert_eq!(px[3], 255);
                assert!(palette.contains(&Color::new(px[0], px[1], px[2])));
            }
        }
    }

    #[test]
    fn test_palette_mode_ignores_invert() {
        let palette = vec![Color::BLACK, Color::WHITE];
        let buffer = PixelBuffer::from_luminance(1, 1, &[20]).unwrap();
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params().palette(palette).invert(true)).unwrap();
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_small_palette_is_rejected() {
        let buffer = PixelBuffer::from_luminance(1, 1, &[20]).unwrap();
        let err = diffuse(&buffer, &FLOYD_STEINBERG, &params().palette(vec![Color::WHITE]));
        assert_eq!(err.unwrap_err(), DitherError::PaletteTooSmall { len: 1 });
    }

    #[test]
    fn test_uniform_grey_mean_is_preserved() {
        let buffer = PixelBuffer::from_luminance(32, 32, &[180; 32 * 32]).unwrap();
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        assert!((mean_red(&out) - 180.0).abs() < 2.0, "mean {}", mean_red(&out));
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = PixelBuffer::filled(0, 5, [0; 4]);
        let out = diffuse(&buffer, &FLOYD_STEINBERG, &params()).unwrap();
        assert_eq!(out.dimensions(), (0, 5));
        assert!(out.bytes().is_empty());
    }
}
