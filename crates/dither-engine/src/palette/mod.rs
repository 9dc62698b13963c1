//! Palette extraction and nearest-color mapping.
//!
//! [`PaletteExtractor`] derives an ordered palette from an image with
//! median cut. [`PaletteMapper`] finds the closest entry for a color and is
//! what error diffusion quantizes against when a palette is active.

mod extract;
mod mapper;

pub use extract::{extract_palette, PaletteExtractor, DEFAULT_MAX_COLORS, DEFAULT_SAMPLE_BUDGET};
pub use mapper::PaletteMapper;
