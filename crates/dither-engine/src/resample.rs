//! Resampling between source, working and target resolutions.
//!
//! Downscaling averages the source area behind each output pixel. Upscaling
//! is strictly nearest-neighbour: destination `(x, y)` reads source
//! `(floor(x * src_w / dst_w), floor(y * src_h / dst_h))`, so a dithered
//! pattern is reproduced as solid blocks and never smoothed.

use crate::buffer::PixelBuffer;

/// Dimensions after fitting the longer edge into `working_resolution`.
///
/// Never upscales. Each edge is rounded and kept at least 1 pixel.
///
/// # Example
///
/// ```
/// use dither_engine::resample::working_dimensions;
///
/// assert_eq!(working_dimensions(4000, 3000, 1024), (1024, 768));
/// assert_eq!(working_dimensions(640, 480, 1024), (640, 480));
/// ```
pub fn working_dimensions(width: u32, height: u32, working_resolution: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest == 0 {
        return (width, height);
    }
    let scale = (working_resolution as f64 / longest as f64).min(1.0);
    let fit = |edge: u32| ((edge as f64 * scale).round() as u32).max(1);
    (fit(width), fit(height))
}

/// Source span `[start, end)` behind destination index `i` of `dst` over `src`.
#[inline]
fn span(i: u32, dst: u32, src: u32) -> (usize, usize) {
    let start = (i as u64 * src as u64 / dst as u64) as usize;
    let end = ((i as u64 + 1) * src as u64 / dst as u64) as usize;
    (start, end.max(start + 1).min(src as usize))
}

/// Area-averaging resize to `width x height`.
///
/// Every channel, alpha included, is the rounded mean of the source pixels
/// covered by the destination pixel. Same-size requests return a copy.
pub fn resample_area(buffer: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    let (sw, sh) = buffer.dimensions();
    if (sw, sh) == (width, height) {
        return buffer.clone();
    }
    if sw == 0 || sh == 0 || width == 0 || height == 0 {
        return PixelBuffer::filled(width, height, [0, 0, 0, 0]);
    }

    let src = buffer.bytes();
    let stride = sw as usize * 4;
    let mut out = PixelBuffer::filled(width, height, [0; 4]);
    let dst = out.bytes_mut();

    let mut i = 0;
    for y in 0..height {
        let (y0, y1) = span(y, height, sh);
        for x in 0..width {
            let (x0, x1) = span(x, width, sw);
            let mut sums = [0u32; 4];
            for row in y0..y1 {
                for px in src[row * stride + x0 * 4..row * stride + x1 * 4].chunks_exact(4) {
                    for c in 0..4 {
                        sums[c] += px[c] as u32;
                    }
                }
            }
            let n = ((y1 - y0) * (x1 - x0)) as u32;
            for c in 0..4 {
                dst[i + c] = ((sums[c] + n / 2) / n) as u8;
            }
            i += 4;
        }
    }
    out
}

/// Normalized 1-D Gaussian weights for `sigma`, radius `ceil(3 * sigma)`.
fn gaussian_weights(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil() as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|d| (-((d * d) as f32) / denom).exp())
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Separable Gaussian blur with clamp-to-edge sampling.
///
/// `sigma <= 0` (or non-finite) returns a copy.
pub fn gaussian_blur(buffer: &PixelBuffer, sigma: f32) -> PixelBuffer {
    if !(sigma.is_finite() && sigma > 0.0) || buffer.pixel_count() == 0 {
        return buffer.clone();
    }

    let weights = gaussian_weights(sigma);
    let radius = (weights.len() / 2) as i64;
    let (w, h) = buffer.dimensions();
    let (width, height) = (w as i64, h as i64);
    let src = buffer.bytes();

    // Horizontal pass into floats, vertical pass back to bytes.
    let mut temp = vec![0.0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 4];
            for (k, weight) in weights.iter().enumerate() {
                let sx = (x + k as i64 - radius).clamp(0, width - 1);
                let i = ((y * width + sx) * 4) as usize;
                for c in 0..4 {
                    acc[c] += src[i + c] as f32 * weight;
                }
            }
            let o = ((y * width + x) * 4) as usize;
            temp[o..o + 4].copy_from_slice(&acc);
        }
    }

    let mut out = PixelBuffer::filled(w, h, [0; 4]);
    let dst = out.bytes_mut();
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 4];
            for (k, weight) in weights.iter().enumerate() {
                let sy = (y + k as i64 - radius).clamp(0, height - 1);
                let i = ((sy * width + x) * 4) as usize;
                for c in 0..4 {
                    acc[c] += temp[i + c] * weight;
                }
            }
            let o = ((y * width + x) * 4) as usize;
            for c in 0..4 {
                dst[o + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Nearest-neighbour resize to `width x height`.
///
/// Same-size requests return a copy.
pub fn upscale_nearest(buffer: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    let (sw, sh) = buffer.dimensions();
    if (sw, sh) == (width, height) {
        return buffer.clone();
    }
    if sw == 0 || sh == 0 {
        return PixelBuffer::filled(width, height, [0, 0, 0, 0]);
    }

    let src = buffer.bytes();
    let columns: Vec<usize> = (0..width)
        .map(|x| (x as u64 * sw as u64 / width as u64) as usize * 4)
        .collect();

    let mut out = PixelBuffer::filled(width, height, [0; 4]);
    let dst = out.bytes_mut();
    let mut i = 0;
    for y in 0..height {
        let sy = (y as u64 * sh as u64 / height as u64) as usize;
        let row = &src[sy * sw as usize * 4..(sy + 1) * sw as usize * 4];
        for &sx in &columns {
            dst[i..i + 4].copy_from_slice(&row[sx..sx + 4]);
            i += 4;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let values: Vec<u8> = (0..width * height)
            .map(|i| if (i % width + i / width) % 2 == 0 { 0 } else { 255 })
            .collect();
        PixelBuffer::from_luminance(width, height, &values).unwrap()
    }

    #[test]
    fn test_working_dimensions() {
        assert_eq!(working_dimensions(4000, 3000, 1024), (1024, 768));
        assert_eq!(working_dimensions(3000, 4000, 1024), (768, 1024));
        assert_eq!(working_dimensions(1024, 10, 1024), (1024, 10));
        assert_eq!(working_dimensions(1000, 1, 10), (10, 1));
        assert_eq!(working_dimensions(0, 0, 10), (0, 0));
    }

    #[test]
    fn test_area_downscale_averages_blocks() {
        let buffer = checker(4, 4);
        let out = resample_area(&buffer, 2, 2);
        assert_eq!(out.dimensions(), (2, 2));
        for y in 0..2 {
            for x in 0..2 {
                // (0 + 255 + 255 + 0 + 2) / 4
                assert_eq!(out.pixel(x, y), [128, 128, 128, 255]);
            }
        }
    }

    #[test]
    fn test_area_same_size_is_copy() {
        let buffer = checker(5, 3);
        assert_eq!(resample_area(&buffer, 5, 3), buffer);
    }

    #[test]
    fn test_area_uneven_ratio_keeps_uniform_color() {
        let buffer = PixelBuffer::filled(7, 5, [10, 20, 30, 255]);
        let out = resample_area(&buffer, 3, 2);
        assert!(out
            .bytes()
            .chunks_exact(4)
            .all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn test_blur_zero_sigma_is_identity() {
        let buffer = checker(6, 6);
        assert_eq!(gaussian_blur(&buffer, 0.0), buffer);
        assert_eq!(gaussian_blur(&buffer, f32::NAN), buffer);
    }

    #[test]
    fn test_blur_keeps_uniform_buffer() {
        let buffer = PixelBuffer::filled(9, 7, [40, 80, 120, 255]);
        assert_eq!(gaussian_blur(&buffer, 1.5), buffer);
    }

    #[test]
    fn test_blur_spreads_spike() {
        let mut values = vec![0u8; 81];
        values[40] = 255;
        let buffer = PixelBuffer::from_luminance(9, 9, &values).unwrap();
        let out = gaussian_blur(&buffer, 1.0);
        let centre = out.pixel(4, 4)[0];
        assert!(centre < 255 && centre > 0);
        assert!(out.pixel(5, 4)[0] > 0);
        assert!(out.pixel(5, 4)[0] < centre);
        assert_eq!(out.pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_upscale_integer_factor_makes_blocks() {
        let buffer = checker(3, 2);
        let k = 4;
        let out = upscale_nearest(&buffer, 3 * k, 2 * k);
        for y in 0..2 * k {
            for x in 0..3 * k {
                assert_eq!(out.pixel(x, y), buffer.pixel(x / k, y / k));
            }
        }
    }

    #[test]
    fn test_upscale_non_integer_uses_floor() {
        let buffer = PixelBuffer::from_luminance(3, 1, &[0, 100, 200]).unwrap();
        let out = upscale_nearest(&buffer, 5, 1);
        let reds: Vec<u8> = out.bytes().chunks_exact(4).map(|p| p[0]).collect();
        // floor(x * 3 / 5) = 0, 0, 1, 1, 2
        assert_eq!(reds, vec![0, 0, 100, 100, 200]);
    }

    #[test]
    fn test_upscale_same_size_is_copy() {
        let buffer = checker(4, 3);
        assert_eq!(upscale_nearest(&buffer, 4, 3), buffer);
    }
}
