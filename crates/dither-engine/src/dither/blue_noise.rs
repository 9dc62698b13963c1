//! 64x64 pseudo-blue-noise threshold mask.
//!
//! The mask holds every rank `0..4096` exactly once. A rank becomes the
//! threshold `rank * 255 / 4096`, and a pixel is white when its luminance is
//! strictly above it, same as the Bayer matrices.
//!
//! The fixed mask orders positions by an integer hash of their coordinates.
//! It is built once per process and shared. The reshuffled mask is a fresh
//! random permutation per call, seeded when the caller asks for one.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::buffer::PixelBuffer;
use crate::error::DitherError;

use super::ordered::threshold_map;
use super::params::{BlueNoiseMask, DitherParams};

/// Mask edge length.
pub const MASK_SIZE: usize = 64;

const MASK_CELLS: usize = MASK_SIZE * MASK_SIZE;

static FIXED_MASK: OnceLock<Vec<u16>> = OnceLock::new();

/// Mix a mask position into a well-spread 32-bit value.
const fn position_hash(x: u32, y: u32) -> u32 {
    let mut hash = y * MASK_SIZE as u32 + x;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;

    hash = hash.wrapping_add(x.wrapping_mul(0x045d_9f3b));
    hash ^= hash >> 11;
    hash = hash.wrapping_add(y.wrapping_mul(0x119d_e1f3));
    hash ^= hash >> 15;

    hash = hash.wrapping_mul(0x27d4_eb2d);
    hash ^= hash >> 13;
    hash
}

/// The shared deterministic mask, row-major.
pub fn fixed_mask() -> &'static [u16] {
    FIXED_MASK.get_or_init(|| {
        let mut order: Vec<usize> = (0..MASK_CELLS).collect();
        order.sort_by_key(|&i| {
            let (x, y) = ((i % MASK_SIZE) as u32, (i / MASK_SIZE) as u32);
            (position_hash(x, y), i)
        });

        let mut mask = vec![0u16; MASK_CELLS];
        for (rank, &i) in order.iter().enumerate() {
            mask[i] = rank as u16;
        }
        tracing::debug!(size = MASK_SIZE, "Built blue-noise mask");
        mask
    })
}

/// A freshly shuffled mask. The same seed always yields the same mask.
pub fn shuffled_mask(seed: Option<u64>) -> Vec<u16> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut mask: Vec<u16> = (0..MASK_CELLS as u16).collect();
    mask.shuffle(&mut rng);
    mask
}

/// Ordered dither with the 64x64 mask selected by `params.blue_noise_mask`.
pub fn blue_noise(buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError> {
    match params.blue_noise_mask {
        BlueNoiseMask::Fixed => apply_mask(buffer, params, fixed_mask()),
        BlueNoiseMask::Reshuffle => apply_mask(buffer, params, &shuffled_mask(params.seed)),
    }
}

fn apply_mask(
    buffer: &PixelBuffer,
    params: &DitherParams,
    mask: &[u16],
) -> Result<PixelBuffer, DitherError> {
    let scale = 255.0 / MASK_CELLS as f32;
    threshold_map(buffer, params, |x, y, lum| {
        lum > mask[(y % MASK_SIZE) * MASK_SIZE + x % MASK_SIZE] as f32 * scale
    })
}
