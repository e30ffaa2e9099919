//! Unrolled 3x3 convolution.
//!
//! Same mathematics as the general kernels restricted to a 3x3 window, with
//! the nine taps written out. A one-pixel border is left untouched.
//!
//! The two variants differ only in how columns are split across lanes:
//! [`conv3x3_block`] hands each lane one contiguous block of columns,
//! [`conv3x3_shifted`] strides columns. Their outputs are identical.

use tessera_core::{clamp_range, Filter3x3, Image, Lane};

use crate::weights::{normalize, weight_sum};

#[inline(always)]
fn tap(input: &Image, x: usize, y: usize, w: u32) -> i64 {
    i64::from(input.get(x, y)) * i64::from(w)
}

/// Centered 3x3 convolution, block-partitioned over columns.
///
/// The column domain `[0, in_x)` is split into contiguous blocks (remainder
/// to the lowest lanes), then each block is clipped to `[1, in_x - 1)`. A
/// lane whose block lies in the border owns no work.
pub fn conv3x3_block(input: &Image, k: &Filter3x3, output: &Image, lane: Lane) {
    let (in_x, in_y) = input.dims();
    let weight = weight_sum(k);

    let cols = clamp_range(lane.block(in_x), 1, in_x.saturating_sub(1));
    for x in cols {
        for y in 1..in_y.saturating_sub(1) {
            let mut acc = 0i64;
            acc += tap(input, x - 1, y - 1, k[0]);
            acc += tap(input, x, y - 1, k[1]);
            acc += tap(input, x + 1, y - 1, k[2]);
            acc += tap(input, x - 1, y, k[3]);
            acc += tap(input, x, y, k[4]);
            acc += tap(input, x + 1, y, k[5]);
            acc += tap(input, x - 1, y + 1, k[6]);
            acc += tap(input, x, y + 1, k[7]);
            acc += tap(input, x + 1, y + 1, k[8]);
            output.set(x, y, normalize(acc, weight));
        }
    }
}

/// Top-left-anchored 3x3 convolution, column-strided across lanes.
///
/// Window corners run over `[0, in_x - 2) x [0, in_y - 2)`; each result
/// lands one pixel down and right.
pub fn conv3x3_shifted(input: &Image, k: &Filter3x3, output: &Image, lane: Lane) {
    let (in_x, in_y) = input.dims();
    let weight = weight_sum(k);

    for x in lane.strided(0, in_x.saturating_sub(2)) {
        for y in 0..in_y.saturating_sub(2) {
            let mut acc = 0i64;
            acc += tap(input, x, y, k[0]);
            acc += tap(input, x + 1, y, k[1]);
            acc += tap(input, x + 2, y, k[2]);
            acc += tap(input, x, y + 1, k[3]);
            acc += tap(input, x + 1, y + 1, k[4]);
            acc += tap(input, x + 2, y + 1, k[5]);
            acc += tap(input, x, y + 2, k[6]);
            acc += tap(input, x + 1, y + 2, k[7]);
            acc += tap(input, x + 2, y + 2, k[8]);
            output.set(x + 1, y + 1, normalize(acc, weight));
        }
    }
}
