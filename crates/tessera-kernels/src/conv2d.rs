//! General-size 2D convolution.
//!
//! Two formulations of the same valid-interior convolution:
//!
//! - [`conv2d`] walks output coordinates and centers the window on each one.
//! - [`conv2d_shifted`] walks window top-left corners from zero, so no index
//!   is ever computed below zero, and writes the result shifted by the
//!   boundary.
//!
//! Both leave a border of `k_x / 2` columns and `k_y / 2` rows unwritten and
//! produce identical values everywhere else. Columns are strided across
//! lanes; each lane sweeps every valid row for the columns it owns, so teams
//! wider than the valid column count leave lanes idle.
//!
//! Preconditions (not checked): odd kernel dimensions, positive weight sum,
//! `input` and `output` distinct and of equal dimensions.

use tessera_core::{Filter, Image, Lane};

use crate::weights::{normalize, weight_sum};

/// Centered-window convolution, column-strided across lanes.
pub fn conv2d(input: &Image, filter: &Filter, output: &Image, lane: Lane) {
    let (in_x, in_y) = input.dims();
    let (k_x, k_y) = (filter.width(), filter.height());
    let boundary_x = filter.boundary_x();
    let boundary_y = filter.boundary_y();
    let weight = weight_sum(filter.weights());

    // halo not computed: only coordinates whose full window fits
    for x in lane.strided(boundary_x, in_x.saturating_sub(boundary_x)) {
        for y in boundary_y..in_y.saturating_sub(boundary_y) {
            let mut acc = 0i64;
            for m in 0..k_y {
                let row = y + m - boundary_y;
                for n in 0..k_x {
                    let col = x + n - boundary_x;
                    acc += i64::from(input.get(col, row)) * i64::from(filter.weight(n, m));
                }
            }
            output.set(x, y, normalize(acc, weight));
        }
    }
}

/// Top-left-anchored convolution, column-strided across lanes.
///
/// The window at `(x, y)` covers `[x, x + k_x) x [y, y + k_y)` and its
/// result lands on `(x + k_x / 2, y + k_y / 2)`.
pub fn conv2d_shifted(input: &Image, filter: &Filter, output: &Image, lane: Lane) {
    let (in_x, in_y) = input.dims();
    let (k_x, k_y) = (filter.width(), filter.height());
    let boundary_x = filter.boundary_x();
    let boundary_y = filter.boundary_y();
    let weight = weight_sum(filter.weights());

    for x in lane.strided(0, in_x.saturating_sub(2 * boundary_x)) {
        for y in 0..in_y.saturating_sub(2 * boundary_y) {
            let mut acc = 0i64;
            for m in 0..k_y {
                for n in 0..k_x {
                    acc += i64::from(input.get(x + n, y + m)) * i64::from(filter.weight(n, m));
                }
            }
            output.set(x + boundary_x, y + boundary_y, normalize(acc, weight));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Image {
        let values = (0..width * height).map(|i| (i * 7 % 23) as i32).collect();
        Image::from_vec(values, width, height).unwrap()
    }

    fn run_all_lanes(
        kernel: fn(&Image, &Filter, &Image, Lane),
        input: &Image,
        filter: &Filter,
        num_lanes: usize,
    ) -> Image {
        let output = Image::zeros(input.width(), input.height());
        for lane in Lane::all(num_lanes) {
            kernel(input, filter, &output, lane);
        }
        output
    }

    #[test]
    fn test_conv2d_box_mean() {
        // 3x3 mean of a 3x3 image: only the center is written
        let input = Image::from_vec((1..=9).collect(), 3, 3).unwrap();
        let out = run_all_lanes(conv2d, &input, &Filter::ones(3, 3), 1);
        assert_eq!(out.to_vec(), vec![0, 0, 0, 0, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_conv2d_truncates() {
        // (1+1+1+1+2+1+1+1+1) / 9 = 10 / 9 = 1
        let mut values = vec![1; 9];
        values[4] = 2;
        let input = Image::from_vec(values, 3, 3).unwrap();
        let out = run_all_lanes(conv2d, &input, &Filter::ones(3, 3), 1);
        assert_eq!(out.get(1, 1), 1);
    }

    #[test]
    fn test_conv2d_weighted_window_orientation() {
        // weight only the right neighbour: output(x, y) = input(x + 1, y)
        let filter = Filter::new(vec![0, 0, 0, 0, 0, 1, 0, 0, 0], 3, 3).unwrap();
        let input = ramp(6, 4);
        let out = run_all_lanes(conv2d, &input, &filter, 2);
        for y in 1..3 {
            for x in 1..5 {
                assert_eq!(out.get(x, y), input.get(x + 1, y), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_conv2d_rectangular_kernel_border() {
        let input = ramp(9, 7);
        let out = run_all_lanes(conv2d, &input, &Filter::ones(5, 3), 3);
        for y in 0..7 {
            for x in 0..9 {
                let interior = (2..7).contains(&x) && (1..6).contains(&y);
                if !interior {
                    assert_eq!(out.get(x, y), 0, "border written at ({x}, {y})");
                }
            }
        }
        assert_ne!(out.get(4, 3), 0);
    }

    #[test]
    fn test_shifted_matches_direct() {
        let input = ramp(11, 8);
        let filter = Filter::new((1..=15).collect(), 5, 3).unwrap();
        let direct = run_all_lanes(conv2d, &input, &filter, 3);
        let shifted = run_all_lanes(conv2d_shifted, &input, &filter, 4);
        assert_eq!(direct, shifted);
    }

    #[test]
    fn test_kernel_larger_than_image_writes_nothing() {
        let input = ramp(4, 4);
        let out = run_all_lanes(conv2d, &input, &Filter::ones(5, 5), 2);
        assert!(out.to_vec().iter().all(|&v| v == 0));
        let out = run_all_lanes(conv2d_shifted, &input, &Filter::ones(5, 5), 2);
        assert!(out.to_vec().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_idle_lanes_leave_output_complete() {
        // 5 valid columns, 16 lanes: most lanes own nothing
        let input = ramp(7, 5);
        let filter = Filter::ones(3, 3);
        let wide = run_all_lanes(conv2d, &input, &filter, 16);
        let single = run_all_lanes(conv2d, &input, &filter, 1);
        assert_eq!(wide, single);
    }

    #[test]
    #[should_panic]
    fn test_zero_weight_sum_faults() {
        let input = ramp(5, 5);
        run_all_lanes(conv2d, &input, &Filter::new(vec![0; 9], 3, 3).unwrap(), 1);
    }
}
