//! Nearest-color lookup for palette-mode error diffusion.

use crate::buffer::Color;
use crate::error::DitherError;

/// Nearest-color search over a fixed palette.
///
/// Distance is plain Euclidean in RGB, unweighted. Ties go to the earlier
/// palette entry, so results depend on palette order only when two entries
/// are exactly equidistant.
#[derive(Debug, Clone)]
pub struct PaletteMapper {
    colors: Vec<Color>,
    channels: Vec<[f32; 3]>,
}

impl PaletteMapper {
    /// Build a mapper. A palette must have at least two entries.
    pub fn new(colors: &[Color]) -> Result<Self, DitherError> {
        if colors.len() < 2 {
            return Err(DitherError::PaletteTooSmall { len: colors.len() });
        }
        Ok(Self {
            colors: colors.to_vec(),
            channels: colors.iter().map(|c| c.to_f32()).collect(),
        })
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; a mapper holds at least two colors.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Palette entries in their original order.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Index of the entry closest to `rgb`. Channels may lie outside
    /// `[0, 255]` when they carry diffused error.
    #[inline]
    pub fn nearest_index(&self, rgb: [f32; 3]) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, c) in self.channels.iter().enumerate() {
            let dr = rgb[0] - c[0];
            let dg = rgb[1] - c[1];
            let db = rgb[2] - c[2];
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best
    }

    /// Closest palette color and its channels as floats.
    #[inline]
    pub fn nearest(&self, rgb: [f32; 3]) -> (Color, [f32; 3]) {
        let i = self.nearest_index(rgb);
        (self.colors[i], self.channels[i])
    }
}
