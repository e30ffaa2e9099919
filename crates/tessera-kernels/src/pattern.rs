//! Deterministic test pattern: init, zero and verify.
//!
//! `init` writes `(row % 16) + (col % 4)`. `verify` checks the interior
//! against the output of [`GAUSSIAN_3X3`](tessera_core::GAUSSIAN_3X3) applied
//! to that pattern, and resets every element it has checked to zero so the
//! buffer can be reused without a separate zero pass. It is a check for that
//! one worked example, not a general-purpose comparison.
//!
//! `init` and `zero` stride rows across lanes when the image is taller than
//! wide, columns otherwise. `verify` strides interior rows.

use tessera_core::{Image, Lane};

/// Value written by [`init`] at `(row, col)`.
#[inline]
pub fn pattern_value(row: usize, col: usize) -> i32 {
    ((row % 16) + (col % 4)) as i32
}

/// Value [`verify`] expects at interior `(row, col)` after the 3x3
/// binomial blur of the init pattern.
///
/// The row term is the row pattern except where the 16-row period wraps
/// (rows 0 and 15 mod 16 blend with their neighbours across the wrap).
pub fn expected(row: usize, col: usize) -> i32 {
    let y = match row % 16 {
        0 => 4,
        15 => 11,
        r => r as i32,
    };
    let x = ((col % 4) / 2) as i32 + 1;
    x + y
}

/// First element that failed [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pattern mismatch at ({row}, {col}): expected {expected}, found {found}")]
pub struct Mismatch {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub expected: i32,
    pub found: i32,
}

impl Mismatch {
    /// Integer status code: the linear index of the failing element, or -1
    /// when that index is 0 so failure never reads as success.
    ///
    /// Indices into an allocated image always fit in `isize`; anything
    /// larger saturates rather than wrapping to a negative or zero code.
    pub fn code(&self) -> isize {
        if self.index == 0 {
            -1
        } else {
            isize::try_from(self.index).unwrap_or(isize::MAX)
        }
    }
}

/// Integer status code of a verify result: 0 on success.
pub fn status_code(result: &Result<(), Mismatch>) -> isize {
    match result {
        Ok(()) => 0,
        Err(m) => m.code(),
    }
}

fn fill(img: &Image, lane: Lane, value: impl Fn(usize, usize) -> i32) {
    let (width, height) = img.dims();
    if height > width {
        for row in lane.strided(0, height) {
            for col in 0..width {
                img.set(col, row, value(row, col));
            }
        }
    } else {
        for col in lane.strided(0, width) {
            for row in 0..height {
                img.set(col, row, value(row, col));
            }
        }
    }
}

/// Write the deterministic pattern into this lane's share of `img`.
pub fn init(img: &Image, lane: Lane) {
    fill(img, lane, pattern_value);
}

/// Zero this lane's share of `img`.
pub fn zero(img: &Image, lane: Lane) {
    fill(img, lane, |_, _| 0);
}

/// Check this lane's interior rows against [`expected`], zeroing each
/// matching element. Stops at the first mismatch.
///
/// Lane `id` checks rows `id + 1, id + 1 + n, ...` below `height - 1`, and
/// columns `[1, width - 1)` of each.
pub fn verify(img: &Image, lane: Lane) -> Result<(), Mismatch> {
    let (width, height) = img.dims();
    for row in lane.strided(0, height.saturating_sub(2)).map(|r| r + 1) {
        for col in 1..width.saturating_sub(1) {
            let index = img.index(col, row);
            let found = img.get_linear(index);
            let expected = expected(row, col);
            if found != expected {
                return Err(Mismatch {
                    index,
                    row,
                    col,
                    expected,
                    found,
                });
            }
            img.set_linear(index, 0);
        }
    }
    Ok(())
}
