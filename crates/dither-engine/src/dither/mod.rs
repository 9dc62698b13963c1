//! Dither strategy registry.
//!
//! Every strategy is a variant of [`DitherAlgorithm`], identified by a stable
//! kebab-case id and grouped into one of three families:
//!
//! - **Error diffusion**: quantize, then push the residual onto unvisited
//!   neighbours through a [`Kernel`]. Works in black and white or against a
//!   palette.
//! - **Ordered**: compare each pixel against a position-dependent threshold
//!   from a Bayer matrix or the 64x64 blue-noise mask.
//! - **Stochastic**: global threshold, random threshold, block halftone and
//!   a checkerboard-modulated threshold.
//!
//! All strategies return a new buffer of the same size with alpha forced to
//! 255. `invert` swaps black and white for every binary strategy. Only error
//! diffusion consults the palette; the other families always produce black
//! and white.
//!
//! # Example
//!
//! ```
//! use dither_engine::{DitherAlgorithm, DitherParams, PixelBuffer};
//!
//! let buffer = PixelBuffer::from_luminance(4, 1, &[50, 50, 200, 200]).unwrap();
//! let params = DitherParams::new(DitherAlgorithm::Threshold);
//! let out = dither_engine::run(&buffer, &params).unwrap();
//! assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
//! assert_eq!(out.pixel(3, 0), [255, 255, 255, 255]);
//! ```

mod blue_noise;
mod diffusion;
mod kernel;
mod ordered;
mod params;
mod stochastic;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{DitherError, UnknownAlgorithm};

pub use blue_noise::{fixed_mask, shuffled_mask, MASK_SIZE};
pub use diffusion::diffuse;
pub use kernel::*;
pub use ordered::{BAYER_2X2, BAYER_4X4, BAYER_8X8};
pub use params::{BlueNoiseMask, CustomKernel, DitherParams};

/// A dithering strategy.
pub trait Dither {
    /// Dither `buffer`, returning a new buffer of the same dimensions.
    fn run(&self, buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError>;
}

impl Dither for Kernel {
    fn run(&self, buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError> {
        diffuse(buffer, self, params)
    }
}

/// Strategy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// Residual propagated through a kernel.
    ErrorDiffusion,
    /// Position-dependent threshold matrix.
    Ordered,
    /// Thresholds without a matrix.
    Stochastic,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::ErrorDiffusion => "error-diffusion",
            Family::Ordered => "ordered",
            Family::Stochastic => "stochastic",
        })
    }
}

/// Dither strategy selection.
///
/// Serializes as its [`id`](DitherAlgorithm::id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherAlgorithm {
    /// Floyd-Steinberg (4 neighbours, energy-conserving).
    #[default]
    FloydSteinberg,
    /// Atkinson (6 neighbours, propagates 6/8).
    Atkinson,
    /// Burkes (7 neighbours over 2 rows).
    Burkes,
    /// Stucki (12 neighbours over 3 rows).
    Stucki,
    /// Sierra (10 neighbours over 3 rows).
    Sierra,
    /// Sierra Lite (3 neighbours).
    SierraLite,
    /// Two-row Sierra (7 neighbours).
    SierraTwoRow,
    /// Jarvis-Judice-Ninke (12 neighbours over 3 rows).
    JarvisJudiceNinke,
    /// Stevenson-Arce (12 sparse neighbours over 4 rows).
    StevensonArce,
    /// Caller-supplied kernel from [`DitherParams::custom_kernel`].
    Custom,
    /// Bayer 2x2 ordered matrix.
    #[serde(rename = "bayer-2x2")]
    Bayer2x2,
    /// Bayer 4x4 ordered matrix.
    #[serde(rename = "bayer-4x4")]
    Bayer4x4,
    /// Bayer 8x8 ordered matrix.
    #[serde(rename = "bayer-8x8")]
    Bayer8x8,
    /// 64x64 blue-noise mask.
    BlueNoise,
    /// Single global threshold.
    Threshold,
    /// Uniform random threshold per pixel.
    RandomThreshold,
    /// Block halftone with circular dots.
    Halftone,
    /// Checkerboard-modulated threshold.
    Checkerboard,
}

impl DitherAlgorithm {
    /// Every strategy, error diffusion first.
    pub const ALL: [DitherAlgorithm; 18] = [
        Self::FloydSteinberg,
        Self::Atkinson,
        Self::Burkes,
        Self::Stucki,
        Self::Sierra,
        Self::SierraLite,
        Self::SierraTwoRow,
        Self::JarvisJudiceNinke,
        Self::StevensonArce,
        Self::Custom,
        Self::Bayer2x2,
        Self::Bayer4x4,
        Self::Bayer8x8,
        Self::BlueNoise,
        Self::Threshold,
        Self::RandomThreshold,
        Self::Halftone,
        Self::Checkerboard,
    ];

    /// Stable identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::FloydSteinberg => "floyd-steinberg",
            Self::Atkinson => "atkinson",
            Self::Burkes => "burkes",
            Self::Stucki => "stucki",
            Self::Sierra => "sierra",
            Self::SierraLite => "sierra-lite",
            Self::SierraTwoRow => "sierra-two-row",
            Self::JarvisJudiceNinke => "jarvis-judice-ninke",
            Self::StevensonArce => "stevenson-arce",
            Self::Custom => "custom",
            Self::Bayer2x2 => "bayer-2x2",
            Self::Bayer4x4 => "bayer-4x4",
            Self::Bayer8x8 => "bayer-8x8",
            Self::BlueNoise => "blue-noise",
            Self::Threshold => "threshold",
            Self::RandomThreshold => "random-threshold",
            Self::Halftone => "halftone",
            Self::Checkerboard => "checkerboard",
        }
    }

    /// One-line human description.
    pub fn description(self) -> &'static str {
        match self {
            Self::FloydSteinberg => "Classic 4-neighbour error diffusion, conserves energy",
            Self::Atkinson => "Propagates 6/8 of the error, lighter midtones and crisp contrast",
            Self::Burkes => "Two-row wide kernel, a faster Stucki",
            Self::Stucki => "Three-row wide kernel with strong centre weights",
            Self::Sierra => "Three-row kernel close to Jarvis-Judice-Ninke",
            Self::SierraLite => "Minimal 3-neighbour Sierra",
            Self::SierraTwoRow => "Two-row Sierra",
            Self::JarvisJudiceNinke => "Three-row 12-neighbour kernel, smooth gradients",
            Self::StevensonArce => "Sparse four-row kernel with hexagonal spread",
            Self::Custom => "User-supplied weight matrix and divisor",
            Self::Bayer2x2 => "Ordered 2x2 Bayer matrix, 5 tone levels",
            Self::Bayer4x4 => "Ordered 4x4 Bayer matrix, 17 tone levels",
            Self::Bayer8x8 => "Ordered 8x8 Bayer matrix, 65 tone levels",
            Self::BlueNoise => "Ordered 64x64 pseudo-blue-noise mask",
            Self::Threshold => "Single global cutoff",
            Self::RandomThreshold => "Uniform random cutoff per pixel",
            Self::Halftone => "Block halftone with circular dots",
            Self::Checkerboard => "Threshold nudged in a checkerboard pattern",
        }
    }

    /// Family this strategy belongs to.
    pub fn family(self) -> Family {
        match self {
            Self::FloydSteinberg
            | Self::Atkinson
            | Self::Burkes
            | Self::Stucki
            | Self::Sierra
            | Self::SierraLite
            | Self::SierraTwoRow
            | Self::JarvisJudiceNinke
            | Self::StevensonArce
            | Self::Custom => Family::ErrorDiffusion,
            Self::Bayer2x2 | Self::Bayer4x4 | Self::Bayer8x8 | Self::BlueNoise => Family::Ordered,
            Self::Threshold | Self::RandomThreshold | Self::Halftone | Self::Checkerboard => {
                Family::Stochastic
            }
        }
    }

    /// Built-in kernel for error-diffusion strategies. `None` for `custom`
    /// and for the other families.
    pub fn kernel(self) -> Option<&'static Kernel> {
        match self {
            Self::FloydSteinberg => Some(&FLOYD_STEINBERG),
            Self::Atkinson => Some(&ATKINSON),
            Self::Burkes => Some(&BURKES),
            Self::Stucki => Some(&STUCKI),
            Self::Sierra => Some(&SIERRA),
            Self::SierraLite => Some(&SIERRA_LITE),
            Self::SierraTwoRow => Some(&SIERRA_TWO_ROW),
            Self::JarvisJudiceNinke => Some(&JARVIS_JUDICE_NINKE),
            Self::StevensonArce => Some(&STEVENSON_ARCE),
            _ => None,
        }
    }

    /// `true` when dithering tiles of edge `tile_size` independently and
    /// stitching them gives the same result as dithering the whole buffer.
    ///
    /// Holds for strategies whose output depends only on absolute position
    /// and the pixel (or, for halftone, its aligned block). Error diffusion
    /// carries state across tile edges, and random threshold draws a
    /// different sequence per tile, so neither is tile-safe.
    pub fn is_tile_safe(self, params: &DitherParams, tile_size: u32) -> bool {
        match self {
            Self::Bayer2x2 => tile_size % 2 == 0,
            Self::Bayer4x4 => tile_size % 4 == 0,
            Self::Bayer8x8 => tile_size % 8 == 0,
            Self::BlueNoise => {
                params.blue_noise_mask == BlueNoiseMask::Fixed
                    && tile_size % MASK_SIZE as u32 == 0
            }
            Self::Threshold => true,
            Self::Checkerboard => tile_size % 2 == 0,
            Self::Halftone => tile_size % params.halftone_cell_value() == 0,
            Self::RandomThreshold => false,
            Self::FloydSteinberg
            | Self::Atkinson
            | Self::Burkes
            | Self::Stucki
            | Self::Sierra
            | Self::SierraLite
            | Self::SierraTwoRow
            | Self::JarvisJudiceNinke
            | Self::StevensonArce
            | Self::Custom => false,
        }
    }
}

impl Dither for DitherAlgorithm {
    fn run(&self, buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError> {
        match self {
            Self::FloydSteinberg => FLOYD_STEINBERG.run(buffer, params),
            Self::Atkinson => ATKINSON.run(buffer, params),
            Self::Burkes => BURKES.run(buffer, params),
            Self::Stucki => STUCKI.run(buffer, params),
            Self::Sierra => SIERRA.run(buffer, params),
            Self::SierraLite => SIERRA_LITE.run(buffer, params),
            Self::SierraTwoRow => SIERRA_TWO_ROW.run(buffer, params),
            Self::JarvisJudiceNinke => JARVIS_JUDICE_NINKE.run(buffer, params),
            Self::StevensonArce => STEVENSON_ARCE.run(buffer, params),
            Self::Custom => {
                let custom = params
                    .custom_kernel
                    .as_ref()
                    .ok_or(DitherError::MissingCustomKernel)?;
                custom.to_kernel()?.run(buffer, params)
            }
            Self::Bayer2x2 => ordered::bayer(buffer, params, &BAYER_2X2),
            Self::Bayer4x4 => ordered::bayer(buffer, params, &BAYER_4X4),
            Self::Bayer8x8 => ordered::bayer(buffer, params, &BAYER_8X8),
            Self::BlueNoise => blue_noise::blue_noise(buffer, params),
            Self::Threshold => stochastic::threshold(buffer, params),
            Self::RandomThreshold => stochastic::random_threshold(buffer, params),
            Self::Halftone => stochastic::halftone(buffer, params),
            Self::Checkerboard => stochastic::checkerboard(buffer, params),
        }
    }
}

impl fmt::Display for DitherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DitherAlgorithm {
    type Err = UnknownAlgorithm;

    /// Parse an id. Case and `_` versus `-` are not significant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|a| a.id() == normalized)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}

/// Run the strategy selected by `params.algorithm`.
pub fn run(buffer: &PixelBuffer, params: &DitherParams) -> Result<PixelBuffer, DitherError> {
    tracing::trace!(
        algorithm = %params.algorithm,
        width = buffer.width(),
        height = buffer.height(),
        "Dithering"
    );
    params.algorithm.run(buffer, params)
}
