//! Error diffusion kernel definitions.
//!
//! Each kernel lists the neighbours that receive a share of a pixel's
//! quantization error as `(dx, dy, weight)` triples, plus the divisor the
//! weights are normalized by.

use std::borrow::Cow;

use crate::error::KernelError;

/// An error diffusion kernel.
///
/// The total error propagated is `sum(weights) / divisor`. Most kernels
/// propagate all of it; Atkinson propagates 6/8 and loses the rest, which
/// lightens midtones.
///
/// `max_dy` is how many rows ahead the kernel reaches, so the error buffer
/// needs `max_dy + 1` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    /// `(dx, dy, weight)` entries. `dx` is flipped on serpentine reverse rows;
    /// `dy` is never negative.
    pub entries: Cow<'static, [(i32, i32, i32)]>,

    /// Each neighbour receives `error * weight / divisor`.
    pub divisor: i32,

    /// Largest `dy` among the entries.
    pub max_dy: usize,
}

impl Kernel {
    /// Build a kernel from a weight matrix.
    ///
    /// Row 0 is the current row and the current pixel sits at column
    /// `(cols - 1) / 2`. Every row must have the same, non-zero length and
    /// row 0 must not carry weight at or left of the current pixel. Zero
    /// cells are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use dither_engine::{Kernel, FLOYD_STEINBERG};
    ///
    /// let kernel = Kernel::from_matrix(&[vec![0, 0, 7], vec![3, 5, 1]], 16).unwrap();
    /// assert_eq!(kernel, FLOYD_STEINBERG);
    /// ```
    pub fn from_matrix(weights: &[Vec<i32>], divisor: i32) -> Result<Self, KernelError> {
        let first = weights.first().ok_or(KernelError::Empty)?;
        let cols = first.len();
        for (row, cells) in weights.iter().enumerate() {
            if cells.is_empty() {
                return Err(KernelError::EmptyRow { row });
            }
            if cells.len() != cols {
                return Err(KernelError::Ragged {
                    row,
                    len: cells.len(),
                    expected: cols,
                });
            }
        }
        if divisor <= 0 {
            return Err(KernelError::NonPositiveDivisor(divisor));
        }

        let origin = (cols - 1) / 2;
        if let Some(column) = first.iter().take(origin + 1).position(|&w| w != 0) {
            return Err(KernelError::BackwardWeight { column });
        }

        let mut entries = Vec::new();
        for (dy, cells) in weights.iter().enumerate() {
            for (col, &w) in cells.iter().enumerate() {
                if w != 0 {
                    entries.push((col as i32 - origin as i32, dy as i32, w));
                }
            }
        }
        let max_dy = entries.iter().map(|&(_, dy, _)| dy as usize).max().unwrap_or(0);

        Ok(Self {
            entries: Cow::Owned(entries),
            divisor,
            max_dy,
        })
    }

    /// Sum of all weights.
    pub fn weight_sum(&self) -> i32 {
        self.entries.iter().map(|&(_, _, w)| w).sum()
    }

    /// Fraction of the quantization error passed on to neighbours.
    pub fn propagation(&self) -> f32 {
        self.weight_sum() as f32 / self.divisor as f32
    }

    /// `true` when the weights sum exactly to the divisor.
    pub fn is_energy_conserving(&self) -> bool {
        self.weight_sum() == self.divisor
    }
}

/// Floyd-Steinberg.
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: Cow::Borrowed(&[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)]),
    divisor: 16,
    max_dy: 1,
};

/// Atkinson. Propagates 6/8 of the error.
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (1, 0, 1),
        (2, 0, 1),
        (-1, 1, 1),
        (0, 1, 1),
        (1, 1, 1),
        (0, 2, 1),
    ]),
    divisor: 8,
    max_dy: 2,
};

/// Burkes.
///
/// ```text
///            X   8   4
///    2   4   8   4   2
/// ```
pub const BURKES: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
    ]),
    divisor: 32,
    max_dy: 1,
};

/// Stucki.
///
/// ```text
///            X   8   4
///    2   4   8   4   2
///    1   2   4   2   1
/// ```
pub const STUCKI: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ]),
    divisor: 42,
    max_dy: 2,
};

/// Sierra (Sierra-3).
///
/// ```text
///            X   5   3
///    2   4   5   4   2
///        2   3   2
/// ```
pub const SIERRA: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (1, 0, 5),
        (2, 0, 3),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 5),
        (1, 1, 4),
        (2, 1, 2),
        (-1, 2, 2),
        (0, 2, 3),
        (1, 2, 2),
    ]),
    divisor: 32,
    max_dy: 2,
};

/// Sierra Lite.
///
/// ```text
///    X   2
///    1   1
/// ```
pub const SIERRA_LITE: Kernel = Kernel {
    entries: Cow::Borrowed(&[(1, 0, 2), (-1, 1, 1), (0, 1, 1)]),
    divisor: 4,
    max_dy: 1,
};

/// Two-row Sierra.
///
/// ```text
///            X   4   3
///    1   2   3   2   1
/// ```
pub const SIERRA_TWO_ROW: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (1, 0, 4),
        (2, 0, 3),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 3),
        (1, 1, 2),
        (2, 1, 1),
    ]),
    divisor: 16,
    max_dy: 1,
};

/// Jarvis-Judice-Ninke.
///
/// ```text
///            X   7   5
///    3   5   7   5   3
///    1   3   5   3   1
/// ```
pub const JARVIS_JUDICE_NINKE: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ]),
    divisor: 48,
    max_dy: 2,
};

/// Stevenson-Arce. Sparse, reaches three rows down and three columns out.
///
/// ```text
///                        X       32
///    12      26      30      16
///        12      26      12
///     5      12      12       5
/// ```
pub const STEVENSON_ARCE: Kernel = Kernel {
    entries: Cow::Borrowed(&[
        (2, 0, 32),
        (-3, 1, 12),
        (-1, 1, 26),
        (1, 1, 30),
        (3, 1, 16),
        (-2, 2, 12),
        (0, 2, 26),
        (2, 2, 12),
        (-3, 3, 5),
        (-1, 3, 12),
        (1, 3, 12),
        (3, 3, 5),
    ]),
    divisor: 200,
    max_dy: 3,
};
