//! Threshold, random-threshold, halftone and checkerboard strategies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::PixelBuffer;
use crate::error::DitherError;

use super::ordered::threshold_map;
use super::params::DitherParams;

/// Threshold offset applied in a checkerboard pattern.
const CHECKER_OFFSET: f32 = 32.0;

/// Single global cutoff: `< threshold` is black.
pub fn threshold(buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError> {
    let t = params.threshold_value();
    threshold_map(buffer, params, |_, _, lum| lum >= t)
}

/// Independent uniform cutoff in `[0, 255)` per pixel.
///
/// Reproducible when `params.seed` is set.
pub fn random_threshold(
    buffer: &PixelBuffer,
    params: &DitherParams,
) -> Result<PixelBuffer, DitherError> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    threshold_map(buffer, params, |_, _, lum| lum > rng.gen_range(0.0..255.0))
}

/// Threshold nudged down on even `x + y` and up on odd `x + y`.
///
/// A cheap pattern toy, not dot diffusion.
pub fn checkerboard(
    buffer: &PixelBuffer,
    params: &DitherParams,
) -> Result<PixelBuffer, DitherError> {
    let t = params.threshold_value();
    threshold_map(buffer, params, |x, y, lum| {
        let offset = if (x + y) % 2 == 0 {
            -CHECKER_OFFSET
        } else {
            CHECKER_OFFSET
        };
        lum >= t + offset
    })
}

/// Block halftone.
///
/// The image is cut into `cell x cell` blocks aligned to the origin. A block
/// whose mean luminance is below the threshold is "on" and gets a black
/// circular dot centred in the block, with radius
/// `cell * sqrt(darkness / pi)` where `darkness = 1 - mean / 255`. Off blocks
/// stay white.
pub fn halftone(buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError> {
    let (w, h) = buffer.dimensions();
    let (width, height) = (w as usize, h as usize);
    let cell = params.halftone_cell_value() as usize;
    let t = params.threshold_value();
    let lum = buffer.luminance_plane();

    let white = params.binary(true);
    let black = params.binary(false);
    let mut out = Vec::with_capacity(buffer.bytes().len());
    for _ in 0..width * height {
        out.extend_from_slice(&[white, white, white, 255]);
    }

    for by in (0..height).step_by(cell) {
        let y_end = (by + cell).min(height);
        for bx in (0..width).step_by(cell) {
            let x_end = (bx + cell).min(width);

            let mut sum = 0.0f32;
            for y in by..y_end {
                sum += lum[y * width + bx..y * width + x_end].iter().sum::<f32>();
            }
            let mean = sum / ((y_end - by) * (x_end - bx)) as f32;
            if mean >= t {
                continue;
            }

            let darkness = 1.0 - mean / 255.0;
            let radius = cell as f32 * (darkness / std::f32::consts::PI).sqrt();
            let r2 = radius * radius;
            let cx = bx as f32 + cell as f32 / 2.0;
            let cy = by as f32 + cell as f32 / 2.0;

            for y in by..y_end {
                let dy = y as f32 + 0.5 - cy;
                for x in bx..x_end {
                    let dx = x as f32 + 0.5 - cx;
                    if dx * dx + dy * dy <= r2 {
                        let i = (y * width + x) * 4;
                        out[i..i + 3].fill(black);
                    }
                }
            }
        }
    }

    PixelBuffer::new(w, h, out)
}
