#![allow(clippy::needless_range_loop, clippy::manual_range_contains)]

//! dither-engine: pixel-buffer dithering
//!
//! Converts full-color RGBA rasters into black-and-white or reduced-palette
//! images. The pieces, leaf to root:
//!
//! - [`PixelBuffer`]: width, height and `width * height * 4` RGBA bytes
//! - [`ToneAdjustment`]: contrast, gamma and highlight remap applied before
//!   dithering
//! - [`PaletteExtractor`]: median-cut palette from an image
//! - [`DitherAlgorithm`]: the strategy registry (error diffusion, ordered,
//!   stochastic), dispatched through the [`Dither`] trait
//! - [`PaletteMapper`]: nearest palette color for error diffusion
//! - [`TilePlan`]: non-overlapping tiles for large buffers
//! - [`resample`]: working-resolution downscale, pre-blur and
//!   nearest-neighbour upscale
//!
//! # Quick Start
//!
//! ```
//! use dither_engine::{DitherAlgorithm, DitherParams, PixelBuffer, ToneAdjustment};
//!
//! let mut buffer = PixelBuffer::filled(16, 16, [120, 140, 160, 255]);
//! ToneAdjustment::new().contrast(20.0).apply(&mut buffer);
//!
//! let params = DitherParams::new(DitherAlgorithm::Atkinson);
//! let out = dither_engine::run(&buffer, &params).unwrap();
//! assert_eq!(out.dimensions(), (16, 16));
//! ```
//!
//! # Determinism
//!
//! Every strategy is a pure function of its input and parameters, with two
//! exceptions that are opt-in: `random-threshold` and the reshuffled
//! blue-noise mask draw from an entropy-seeded generator unless
//! [`DitherParams::seed`] is set.
//!
//! # Error Handling
//!
//! Structural problems fail fast with [`DitherError`]: malformed custom
//! kernels, palettes with fewer than two colors, buffers whose byte length
//! does not match their size. Scalars (threshold, strength, contrast, gamma,
//! highlights, halftone cell) are clamped, never rejected.

pub mod buffer;
pub mod dither;
pub mod error;
pub mod palette;
pub mod resample;
pub mod tiling;
pub mod tone;

#[cfg(test)]
mod domain_tests;

pub use buffer::{luminance, Color, PixelBuffer};
pub use dither::{
    run, BlueNoiseMask, CustomKernel, Dither, DitherAlgorithm, DitherParams, Family, Kernel,
    FLOYD_STEINBERG,
};
pub use error::{DitherError, KernelError, ParseColorError, UnknownAlgorithm};
pub use palette::{extract_palette, PaletteExtractor, PaletteMapper, DEFAULT_MAX_COLORS};
pub use tiling::{Tile, TilePlan};
pub use tone::ToneAdjustment;
