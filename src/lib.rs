//! Ditherlab
//!
//! Cooperative rendering around the `dither-engine` crate: cancellable tiled
//! dithering, resolution-preserving export, YAML presets and PNG I/O.
//! This library exposes modules for the CLI and integration testing.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;
