//! Parameters shared by every dither strategy.

use serde::{Deserialize, Serialize};

use crate::buffer::Color;
use crate::error::KernelError;

use super::kernel::Kernel;
use super::DitherAlgorithm;

const DEFAULT_THRESHOLD: f32 = 128.0;
const DEFAULT_HALFTONE_CELL: u32 = 6;
const HALFTONE_CELL_RANGE: (u32, u32) = (2, 64);

/// Which 64x64 mask the `blue-noise` strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueNoiseMask {
    /// Computed once per process and reused, so output is deterministic.
    #[default]
    Fixed,
    /// Shuffled on every call. Reproducible only when a seed is set.
    Reshuffle,
}

/// A caller-supplied weight matrix, validated with [`Kernel::from_matrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomKernel {
    /// Rows of integer weights; row 0 is the current row.
    pub weights: Vec<Vec<i32>>,
    /// Positive normalizing divisor.
    pub divisor: i32,
}

impl CustomKernel {
    /// Create a custom kernel description.
    pub fn new(weights: Vec<Vec<i32>>, divisor: i32) -> Self {
        Self { weights, divisor }
    }

    /// Validate and convert into a [`Kernel`].
    pub fn to_kernel(&self) -> Result<Kernel, KernelError> {
        Kernel::from_matrix(&self.weights, self.divisor)
    }
}

/// Settings for a dither run.
///
/// Scalars are clamped when read through the accessor methods: threshold to
/// `[0, 255]`, halftone cell to `[2, 64]`. Error diffusion strength only has
/// a floor of zero.
///
/// # Example
///
/// ```
/// use dither_engine::{DitherAlgorithm, DitherParams};
///
/// let params = DitherParams::new(DitherAlgorithm::Atkinson)
///     .threshold(300.0)
///     .serpentine(false);
/// assert_eq!(params.threshold_value(), 255.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DitherParams {
    /// Strategy to run.
    pub algorithm: DitherAlgorithm,
    /// Binary cutoff on luminance.
    pub threshold: f32,
    /// Swap black and white in binary output.
    pub invert: bool,
    /// Alternate scan direction on odd rows.
    pub serpentine: bool,
    /// Multiplier on the diffused residual.
    pub error_diffusion_strength: f32,
    /// Palette for error diffusion; `None` means black and white.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<Color>>,
    /// Weights for the `custom` strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_kernel: Option<CustomKernel>,
    /// Seed for the stochastic strategies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Mask mode for `blue-noise`.
    pub blue_noise_mask: BlueNoiseMask,
    /// Block edge for `halftone`.
    pub halftone_cell: u32,
}

impl Default for DitherParams {
    fn default() -> Self {
        Self {
            algorithm: DitherAlgorithm::default(),
            threshold: DEFAULT_THRESHOLD,
            invert: false,
            serpentine: true,
            error_diffusion_strength: 1.0,
            palette: None,
            custom_kernel: None,
            seed: None,
            blue_noise_mask: BlueNoiseMask::default(),
            halftone_cell: DEFAULT_HALFTONE_CELL,
        }
    }
}

impl DitherParams {
    /// Default parameters for `algorithm`.
    pub fn new(algorithm: DitherAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Set the binary threshold.
    #[inline]
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set output inversion.
    #[inline]
    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Set serpentine scanning.
    #[inline]
    pub fn serpentine(mut self, serpentine: bool) -> Self {
        self.serpentine = serpentine;
        self
    }

    /// Set the error diffusion strength.
    #[inline]
    pub fn strength(mut self, strength: f32) -> Self {
        self.error_diffusion_strength = strength;
        self
    }

    /// Set the palette.
    #[inline]
    pub fn palette(mut self, palette: Vec<Color>) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Set the custom kernel.
    #[inline]
    pub fn custom_kernel(mut self, kernel: CustomKernel) -> Self {
        self.custom_kernel = Some(kernel);
        self
    }

    /// Set the stochastic seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the blue-noise mask mode.
    #[inline]
    pub fn blue_noise_mask(mut self, mask: BlueNoiseMask) -> Self {
        self.blue_noise_mask = mask;
        self
    }

    /// Set the halftone cell size.
    #[inline]
    pub fn halftone_cell(mut self, cell: u32) -> Self {
        self.halftone_cell = cell;
        self
    }

    /// Threshold clamped to `[0, 255]`; NaN falls back to 128.
    pub fn threshold_value(&self) -> f32 {
        if self.threshold.is_nan() {
            return DEFAULT_THRESHOLD;
        }
        self.threshold.clamp(0.0, 255.0)
    }

    /// Error diffusion strength, never negative; non-finite falls back to 1.
    pub fn strength_value(&self) -> f32 {
        if !self.error_diffusion_strength.is_finite() {
            return 1.0;
        }
        self.error_diffusion_strength.max(0.0)
    }

    /// Halftone cell clamped to `[2, 64]`.
    pub fn halftone_cell_value(&self) -> u32 {
        self.halftone_cell
            .clamp(HALFTONE_CELL_RANGE.0, HALFTONE_CELL_RANGE.1)
    }

    /// Output byte for a binary decision, honoring `invert`.
    #[inline]
    pub(crate) fn binary(&self, white: bool) -> u8 {
        if white != self.invert {
            255
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = DitherParams::default();
        assert_eq!(params.algorithm, DitherAlgorithm::FloydSteinberg);
        assert_eq!(params.threshold_value(), 128.0);
        assert!(params.serpentine);
        assert!(!params.invert);
        assert_eq!(params.strength_value(), 1.0);
        assert_eq!(params.blue_noise_mask, BlueNoiseMask::Fixed);
        assert_eq!(params.halftone_cell_value(), 6);
    }

    #[test]
    fn test_scalars_are_clamped() {
        let params = DitherParams::default()
            .threshold(-20.0)
            .strength(-0.5)
            .halftone_cell(1);
        assert_eq!(params.threshold_value(), 0.0);
        assert_eq!(params.strength_value(), 0.0);
        assert_eq!(params.halftone_cell_value(), 2);

        let params = DitherParams::default()
            .threshold(f32::NAN)
            .strength(f32::INFINITY)
            .halftone_cell(1000);
        assert_eq!(params.threshold_value(), 128.0);
        assert_eq!(params.strength_value(), 1.0);
        assert_eq!(params.halftone_cell_value(), 64);
    }

    #[test]
    fn test_strength_has_no_upper_bound() {
        assert_eq!(DitherParams::default().strength(3.0).strength_value(), 3.0);
        assert_eq!(DitherParams::default().strength(7.5).strength_value(), 7.5);
        assert_eq!(
            DitherParams::default().strength(f32::NAN).strength_value(),
            1.0
        );
    }

    #[test]
    fn test_binary_honors_invert() {
        let params = DitherParams::default();
        assert_eq!(params.binary(true), 255);
        assert_eq!(params.binary(false), 0);
        let inverted = params.invert(true);
        assert_eq!(inverted.binary(true), 0);
        assert_eq!(inverted.binary(false), 255);
    }

    #[test]
    fn test_deserialize_partial() {
        let params: DitherParams = serde_json::from_str(
            r##"{
                "algorithm": "stucki",
                "palette": ["#000", "#ff0000", "#ffffff"],
                "custom_kernel": {"weights": [[0, 0, 1]], "divisor": 1},
                "blue_noise_mask": "reshuffle"
            }"##,
        )
        .unwrap();
        assert_eq!(params.algorithm, DitherAlgorithm::Stucki);
        assert_eq!(params.threshold, 128.0);
        assert_eq!(
            params.palette,
            Some(vec![Color::BLACK, Color::new(255, 0, 0), Color::WHITE])
        );
        assert_eq!(params.blue_noise_mask, BlueNoiseMask::Reshuffle);
        assert!(params.custom_kernel.unwrap().to_kernel().is_ok());
    }

    #[test]
    fn test_rejects_bad_palette_entry() {
        let err = serde_json::from_str::<DitherParams>(r##"{"palette": ["#12"]}"##);
        assert!(err.is_err());
    }
}
