//! Pixel buffers and colors.
//!
//! [`PixelBuffer`] is the data unit every stage consumes and produces:
//! width, height, and `width * height * 4` RGBA bytes. [`Color`] is the
//! opaque RGB triple palettes are made of.

mod color;
mod pixel_buffer;

pub use color::{luminance, Color, REC601, REC709};
pub use pixel_buffer::PixelBuffer;
