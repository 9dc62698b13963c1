//! Error types for the dithering engine.
//!
//! Structural problems (malformed kernels, undersized palettes, buffers whose
//! byte length does not match their dimensions) fail fast. Out-of-range
//! scalar parameters are never errors; they are clamped where they are read.

use std::num::ParseIntError;

use thiserror::Error;

/// Error type for custom error-diffusion kernels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The weight matrix has no rows.
    #[error("kernel weight matrix is empty")]
    Empty,

    /// A row of the weight matrix has no columns.
    #[error("kernel row {row} is empty")]
    EmptyRow {
        /// Index of the offending row
        row: usize,
    },

    /// Rows of the weight matrix differ in length.
    #[error("kernel row {row} has {len} columns, expected {expected}")]
    Ragged {
        /// Index of the offending row
        row: usize,
        /// Length of the offending row
        len: usize,
        /// Length of row 0
        expected: usize,
    },

    /// The divisor is zero or negative.
    #[error("kernel divisor must be positive, got {0}")]
    NonPositiveDivisor(i32),

    /// Row 0 carries weight at or left of the current pixel, i.e. on a pixel
    /// that has already been quantized.
    #[error("kernel row 0 has weight at column {column}, at or before the current pixel")]
    BackwardWeight {
        /// Column of the offending weight
        column: usize,
    },
}

/// Error type for parsing hex color strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    /// Hex string has invalid length (must be 3 or 6 characters after stripping '#')
    #[error("invalid hex color length (expected 3 or 6 characters)")]
    InvalidLength,

    /// Invalid hexadecimal character encountered
    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),

    /// Something other than a hex digit, such as a sign
    #[error("invalid hex color digit")]
    InvalidDigit,
}

/// Error type for parsing strategy identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dither algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

/// Unified error type for the dithering engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DitherError {
    /// The custom kernel failed validation.
    #[error("invalid custom kernel: {0}")]
    InvalidKernel(#[from] KernelError),

    /// The `custom` strategy was selected without a kernel.
    #[error("custom strategy selected but no custom kernel supplied")]
    MissingCustomKernel,

    /// A palette was supplied with fewer than two entries.
    #[error("palette needs at least 2 colors, got {len}")]
    PaletteTooSmall {
        /// Number of colors supplied
        len: usize,
    },

    /// Byte length does not equal `width * height * 4`.
    #[error("buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// Required byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// A processed tile came back with different dimensions than it went in.
    #[error("tile {index} returned {actual_width}x{actual_height}, expected {width}x{height}")]
    TileMismatch {
        /// Tile index in raster order
        index: usize,
        /// Tile width
        width: u32,
        /// Tile height
        height: u32,
        /// Width of the returned buffer
        actual_width: u32,
        /// Height of the returned buffer
        actual_height: u32,
    },
}
