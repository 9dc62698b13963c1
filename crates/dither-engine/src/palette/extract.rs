//! Median-cut palette extraction.
//!
//! Sampling keeps extraction cost bounded: images above the sample budget
//! are read through a nearest-neighbour downscale by `sqrt(budget / total)`.
//! Nearly transparent pixels (alpha below 20) are skipped.
//!
//! The cut itself starts with one box holding every sample and repeatedly
//! splits the box with the widest channel range along that channel at its
//! median, until the box count reaches the cap or nothing is left to split.
//! Each box contributes the rounded mean of its samples, and the palette is
//! ordered by Rec. 709 luminance so the same image always yields the same
//! ordering.

use crate::buffer::{Color, PixelBuffer};

/// Default maximum number of colors.
pub const DEFAULT_MAX_COLORS: usize = 64;

/// Default number of pixels sampled before downscaling kicks in.
pub const DEFAULT_SAMPLE_BUDGET: usize = 65_536;

/// Samples with alpha below this are ignored.
const MIN_ALPHA: u8 = 20;

const MAX_COLORS_RANGE: (usize, usize) = (2, 256);

/// Median-cut palette extractor.
///
/// # Example
///
/// ```
/// use dither_engine::{Color, PaletteExtractor, PixelBuffer};
///
/// let mut buffer = PixelBuffer::filled(4, 1, [250, 250, 250, 255]);
/// buffer.set_pixel(0, 0, [10, 20, 30, 255]);
///
/// let palette = PaletteExtractor::new().max_colors(8).extract(&buffer).unwrap();
/// assert_eq!(palette, vec![Color::new(10, 20, 30), Color::new(250, 250, 250)]);
/// ```
#[derive(Debug, Clone)]
pub struct PaletteExtractor {
    max_colors: usize,
    sample_budget: usize,
}

impl Default for PaletteExtractor {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            sample_budget: DEFAULT_SAMPLE_BUDGET,
        }
    }
}

impl PaletteExtractor {
    /// Extractor with the default cap (64) and sample budget (65,536).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum palette size, clamped to `[2, 256]`.
    #[inline]
    pub fn max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors.clamp(MAX_COLORS_RANGE.0, MAX_COLORS_RANGE.1);
        self
    }

    /// Pixel budget for sampling (at least 1).
    #[inline]
    pub fn sample_budget(mut self, budget: usize) -> Self {
        self.sample_budget = budget.max(1);
        self
    }

    /// Extract a palette from `buffer`.
    ///
    /// Returns `None` when the image has fewer than two distinct usable
    /// colors. Callers keep whatever palette they had.
    pub fn extract(&self, buffer: &PixelBuffer) -> Option<Vec<Color>> {
        let samples = self.sample(buffer);
        if samples.len() < 2 {
            tracing::debug!(samples = samples.len(), "Too few samples for palette");
            return None;
        }
        let sample_count = samples.len();

        let palette = median_cut(samples, self.max_colors);
        if palette.len() < 2 {
            tracing::debug!(samples = sample_count, "Image has a single color");
            return None;
        }

        tracing::debug!(
            samples = sample_count,
            colors = palette.len(),
            "Extracted palette"
        );
        Some(palette)
    }

    fn sample(&self, buffer: &PixelBuffer) -> Vec<[u8; 3]> {
        let (width, height) = buffer.dimensions();
        let total = buffer.pixel_count();
        if total == 0 {
            return Vec::new();
        }

        let (sw, sh) = if total > self.sample_budget {
            let scale = (self.sample_budget as f64 / total as f64).sqrt();
            (
                ((width as f64 * scale).floor() as u32).max(1),
                ((height as f64 * scale).floor() as u32).max(1),
            )
        } else {
            (width, height)
        };

        let mut samples = Vec::with_capacity(sw as usize * sh as usize);
        for sy in 0..sh {
            let y = source_coord(sy, sh, height);
            for sx in 0..sw {
                let x = source_coord(sx, sw, width);
                let [r, g, b, a] = buffer.pixel(x, y);
                if a >= MIN_ALPHA {
                    samples.push([r, g, b]);
                }
            }
        }
        samples
    }
}

/// Extract up to `max_colors` colors with the default sample budget.
pub fn extract_palette(buffer: &PixelBuffer, max_colors: usize) -> Option<Vec<Color>> {
    PaletteExtractor::new().max_colors(max_colors).extract(buffer)
}

/// Centre of sample cell `i` of `n` mapped onto `len` source pixels.
#[inline]
fn source_coord(i: u32, n: u32, len: u32) -> u32 {
    if n == len {
        return i;
    }
    let pos = ((i as u64 * 2 + 1) * len as u64) / (n as u64 * 2);
    (pos as u32).min(len - 1)
}

#[derive(Debug)]
struct ColorBox {
    pixels: Vec<[u8; 3]>,
    min: [u8; 3],
    max: [u8; 3],
}

impl ColorBox {
    fn new(pixels: Vec<[u8; 3]>) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for p in &pixels {
            for c in 0..3 {
                min[c] = min[c].min(p[c]);
                max[c] = max[c].max(p[c]);
            }
        }
        Self { pixels, min, max }
    }

    /// Widest channel and its range. Ties prefer R, then G.
    fn widest(&self) -> (usize, u8) {
        let mut channel = 0;
        let mut range = 0;
        for c in 0..3 {
            let r = self.max[c] - self.min[c];
            if r > range {
                range = r;
                channel = c;
            }
        }
        (channel, range)
    }

    fn can_split(&self) -> bool {
        self.pixels.len() >= 2 && self.widest().1 > 0
    }

    /// Split along the widest channel at the median.
    ///
    /// When the median falls inside a run of equal channel values the cut
    /// moves to the nearest run boundary, so no value is shared between the
    /// two children.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest();
        self.pixels.sort_by_key(|p| p[channel]);

        let len = self.pixels.len();
        let mid = len / 2;
        let is_boundary = |s: usize| s >= 1 && s < len && self.pixels[s - 1][channel] != self.pixels[s][channel];
        let cut = (0..len)
            .flat_map(|d| [mid.checked_sub(d), mid.checked_add(d)])
            .flatten()
            .find(|&s| is_boundary(s))
            .unwrap_or(mid.max(1));

        let upper = self.pixels.split_off(cut);
        (ColorBox::new(self.pixels), ColorBox::new(upper))
    }

    fn mean(&self) -> Color {
        let n = self.pixels.len() as u64;
        let mut sums = [0u64; 3];
        for p in &self.pixels {
            for c in 0..3 {
                sums[c] += p[c] as u64;
            }
        }
        let avg = |s: u64| ((s + n / 2) / n) as u8;
        Color::new(avg(sums[0]), avg(sums[1]), avg(sums[2]))
    }
}

fn median_cut(samples: Vec<[u8; 3]>, max_colors: usize) -> Vec<Color> {
    let mut boxes = vec![ColorBox::new(samples)];

    while boxes.len() < max_colors {
        let mut pick: Option<(usize, u8)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if !b.can_split() {
                continue;
            }
            let (_, range) = b.widest();
            if pick.map_or(true, |(_, best)| range > best) {
                pick = Some((i, range));
            }
        }
        let Some((index, _)) = pick else {
            break;
        };

        let (left, right) = boxes.remove(index).split();
        boxes.insert(index, right);
        boxes.insert(index, left);
    }

    let mut palette: Vec<Color> = Vec::with_capacity(boxes.len());
    for color in boxes.iter().map(ColorBox::mean) {
        if !palette.contains(&color) {
            palette.push(color);
        }
    }
    palette.sort_by(|a, b| {
        a.relative_luminance()
            .total_cmp(&b.relative_luminance())
            .then_with(|| a.to_bytes().cmp(&b.to_bytes()))
    });
    palette
}
