//! Luminance remapping applied before dithering.
//!
//! [`ToneAdjustment`] remaps each pixel's Rec. 601 luminance through a
//! contrast curve around 0.5, a gamma curve, and an optional highlight boost,
//! then rescales the RGB channels by `new / old` luminance so hue and chroma
//! are kept.

use serde::{Deserialize, Serialize};

use crate::buffer::{luminance, PixelBuffer};

const NEUTRAL_TOLERANCE: f32 = 1e-3;
const OLD_LUMINANCE_EPSILON: f32 = 1e-6;

/// Highlight boost ramps in over this normalized luminance range.
const HIGHLIGHT_RAMP: (f32, f32) = (0.6, 1.0);

/// Contrast, gamma and highlight settings.
///
/// Values are clamped when applied, never rejected:
/// contrast to `[-100, 100]`, gamma to `[0.5, 2.0]`, highlights to `[0, 100]`.
///
/// # Example
///
/// ```
/// use dither_engine::{PixelBuffer, ToneAdjustment};
///
/// let mut buffer = PixelBuffer::from_luminance(1, 1, &[200]).unwrap();
/// ToneAdjustment::new().contrast(50.0).apply(&mut buffer);
/// assert!(buffer.pixel(0, 0)[0] > 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneAdjustment {
    /// Contrast around mid-grey, `0` is neutral.
    pub contrast: f32,
    /// Power applied to normalized luminance, `1` is neutral.
    pub gamma: f32,
    /// Highlight boost strength, `0` is off.
    pub highlights: f32,
}

impl Default for ToneAdjustment {
    fn default() -> Self {
        Self {
            contrast: 0.0,
            gamma: 1.0,
            highlights: 0.0,
        }
    }
}

impl ToneAdjustment {
    /// Neutral settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set contrast.
    #[inline]
    pub fn contrast(mut self, contrast: f32) -> Self {
        self.contrast = contrast;
        self
    }

    /// Set gamma.
    #[inline]
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set highlight boost.
    #[inline]
    pub fn highlights(mut self, highlights: f32) -> Self {
        self.highlights = highlights;
        self
    }

    fn clamped(&self) -> (f32, f32, f32) {
        (
            finite_or(self.contrast, 0.0).clamp(-100.0, 100.0),
            finite_or(self.gamma, 1.0).clamp(0.5, 2.0),
            finite_or(self.highlights, 0.0).clamp(0.0, 100.0),
        )
    }

    /// `true` when applying these settings would not change any pixel.
    pub fn is_neutral(&self) -> bool {
        let (contrast, gamma, highlights) = self.clamped();
        contrast.abs() < NEUTRAL_TOLERANCE
            && (gamma - 1.0).abs() < NEUTRAL_TOLERANCE
            && highlights < NEUTRAL_TOLERANCE
    }

    /// Map a normalized luminance in `[0, 1]` through the tone curve.
    pub fn map_luminance(&self, l0: f32) -> f32 {
        let (contrast, gamma, highlights) = self.clamped();

        let mut l = (0.5 + (l0 - 0.5) * (1.0 + contrast / 100.0)).clamp(0.0, 1.0);
        l = l.powf(gamma);

        if highlights > 0.0 {
            let boosted = l.powf(1.0 + 1.5 * highlights / 100.0);
            let w = smoothstep(HIGHLIGHT_RAMP.0, HIGHLIGHT_RAMP.1, l);
            l = l * (1.0 - w) + boosted * w;
        }
        l
    }

    /// Remap every pixel of `buffer` in place. Alpha is untouched.
    pub fn apply(&self, buffer: &mut PixelBuffer) {
        if self.is_neutral() {
            return;
        }

        for px in buffer.bytes_mut().chunks_exact_mut(4) {
            let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
            let old = luminance(r, g, b);
            if old < OLD_LUMINANCE_EPSILON {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            let new = self.map_luminance(old / 255.0) * 255.0;
            let scale = new / old;
            px[0] = (r * scale).round().clamp(0.0, 255.0) as u8;
            px[1] = (g * scale).round().clamp(0.0, 255.0) as u8;
            px[2] = (b * scale).round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[inline]
fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Cubic Hermite ramp from 0 at `edge0` to 1 at `edge1`.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
