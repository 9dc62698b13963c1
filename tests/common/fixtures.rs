//! Test fixtures and helpers.

use std::path::PathBuf;

use dither_engine::{luminance, PixelBuffer};
use tempfile::TempDir;

/// Horizontal grey ramp from black to white.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    let values: Vec<u8> = (0..width * height)
        .map(|i| ((i % width) * 255 / width.saturating_sub(1).max(1)) as u8)
        .collect();
    PixelBuffer::from_luminance(width, height, &values).unwrap()
}

/// Color buffer with structure in every channel and partial alpha.
pub fn scene(width: u32, height: u32) -> PixelBuffer {
    let mut bytes = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            bytes.extend_from_slice(&[
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x * 7 + y * 13) % 256) as u8,
                (128 + (x + y) % 128) as u8,
            ]);
        }
    }
    PixelBuffer::new(width, height, bytes).unwrap()
}

/// Mean Rec.601 luminance of a buffer.
pub fn mean_luminance(buffer: &PixelBuffer) -> f64 {
    let sum: f64 = buffer
        .bytes()
        .chunks_exact(4)
        .map(|p| luminance(p[0] as f32, p[1] as f32, p[2] as f32) as f64)
        .sum();
    sum / buffer.pixel_count() as f64
}

/// Write `content` to `name` inside a fresh temp dir.
///
/// The returned `TempDir` must outlive the path.
pub fn write_temp_file(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Config with two presets used across tests.
pub const SAMPLE_CONFIG: &str = r##"
working_resolution: 64
default_preset: newsprint
presets:
  newsprint:
    algorithm: floyd-steinberg
    threshold: 128
    serpentine: true
    tone:
      contrast: 10
  poster:
    algorithm: bayer-4x4
    invert: true
    palette: ["#000000", "#ffffff"]
    pre_blur: 0.5
"##;
