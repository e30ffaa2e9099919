//! Kernel variant selection.
//!
//! One entry point per variant so drivers, the CLI and benchmarks can pick
//! a kernel by name. The 3x3 variants need a 3x3 filter; that is the only
//! thing checked here.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use tessera_core::{clamp_range, Filter, Image, Lane, Result, TesseraError};

use crate::conv2d::{conv2d, conv2d_shifted};
use crate::conv3x3::{conv3x3_block, conv3x3_shifted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Centered window, any odd size, strided columns.
    Direct,
    /// Top-left-anchored window, any odd size, strided columns.
    Shifted,
    /// Unrolled 3x3, block-partitioned columns.
    Unrolled3x3Block,
    /// Unrolled 3x3, top-left-anchored, strided columns.
    Unrolled3x3Shifted,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Direct,
        Variant::Shifted,
        Variant::Unrolled3x3Block,
        Variant::Unrolled3x3Shifted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Direct => "direct",
            Variant::Shifted => "shifted",
            Variant::Unrolled3x3Block => "3x3-block",
            Variant::Unrolled3x3Shifted => "3x3-shifted",
        }
    }

    /// Whether the variant only accepts 3x3 filters.
    pub fn is_3x3(&self) -> bool {
        matches!(self, Variant::Unrolled3x3Block | Variant::Unrolled3x3Shifted)
    }

    /// Run this lane's share of the convolution.
    pub fn run(&self, input: &Image, filter: &Filter, output: &Image, lane: Lane) -> Result<()> {
        match self {
            Variant::Direct => conv2d(input, filter, output, lane),
            Variant::Shifted => conv2d_shifted(input, filter, output, lane),
            Variant::Unrolled3x3Block => conv3x3_block(input, self.filter_3x3(filter)?, output, lane),
            Variant::Unrolled3x3Shifted => {
                conv3x3_shifted(input, self.filter_3x3(filter)?, output, lane)
            }
        }
        Ok(())
    }

    fn filter_3x3<'f>(&self, filter: &'f Filter) -> Result<&'f tessera_core::Filter3x3> {
        filter.as_3x3().ok_or(TesseraError::KernelShape {
            variant: self.name(),
            expected: "3x3",
            width: filter.width(),
            height: filter.height(),
        })
    }

    /// Output rectangle `(columns, rows)` this variant writes for an image
    /// of `(width, height)`. Everything outside is left untouched.
    pub fn valid_region(&self, dims: (usize, usize), filter: &Filter) -> (Range<usize>, Range<usize>) {
        let (width, height) = dims;
        let (bx, by) = if self.is_3x3() {
            (1, 1)
        } else {
            (filter.boundary_x(), filter.boundary_y())
        };
        let cols = bx..width.saturating_sub(bx).max(bx);
        let rows = by..height.saturating_sub(by).max(by);
        (cols, rows)
    }

    /// Columns `lane` writes for an image `width` wide.
    pub fn owned_columns(&self, lane: Lane, width: usize, filter: &Filter) -> Vec<usize> {
        let (cols, _) = self.valid_region((width, 0), filter);
        match self {
            Variant::Direct => lane.strided(cols.start, cols.end).collect(),
            Variant::Shifted | Variant::Unrolled3x3Shifted => lane
                .strided(0, cols.len())
                .map(|x| x + cols.start)
                .collect(),
            Variant::Unrolled3x3Block => clamp_range(lane.block(width), cols.start, cols.end).collect(),
        }
    }

    /// Number of lanes in a team of `num_lanes` that own no columns.
    pub fn idle_lanes(&self, num_lanes: usize, width: usize, filter: &Filter) -> usize {
        Lane::all(num_lanes)
            .filter(|&lane| self.owned_columns(lane, width, filter).is_empty())
            .count()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown variant name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant '{0}' (expected one of: direct, shifted, 3x3-block, 3x3-shifted)")]
pub struct ParseVariantError(pub String);

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{BOX_3X3, GAUSSIAN_3X3};

    #[test]
    fn test_parse_roundtrip_names() {
        for v in Variant::ALL {
            assert_eq!(v.name().parse::<Variant>(), Ok(v));
            assert_eq!(v.to_string(), v.name());
        }
        assert_eq!(" 3X3-Block ".parse::<Variant>(), Ok(Variant::Unrolled3x3Block));
        assert!("winograd".parse::<Variant>().is_err());
    }

    #[test]
    fn test_3x3_variant_rejects_other_sizes() {
        let input = Image::zeros(8, 8);
        let output = Image::zeros(8, 8);
        let err = Variant::Unrolled3x3Shifted
            .run(&input, &Filter::ones(5, 5), &output, Lane::single())
            .unwrap_err();
        assert!(matches!(err, TesseraError::KernelShape { width: 5, height: 5, .. }));
        assert!(Variant::Direct
            .run(&input, &Filter::ones(5, 5), &output, Lane::single())
            .is_ok());
    }

    #[test]
    fn test_all_variants_agree_on_3x3() {
        let values = (0..90).map(|i| (i * 13 % 31) as i32).collect();
        let input = Image::from_vec(values, 10, 9).unwrap();
        let filter = Filter::from_3x3(&GAUSSIAN_3X3);
        let reference = Image::zeros(10, 9);
        for lane in Lane::all(1) {
            Variant::Direct.run(&input, &filter, &reference, lane).unwrap();
        }
        for v in Variant::ALL {
            let out = Image::zeros(10, 9);
            for lane in Lane::all(3) {
                v.run(&input, &filter, &out, lane).unwrap();
            }
            assert_eq!(out, reference, "{v}");
        }
    }

    #[test]
    fn test_valid_region() {
        let f5 = Filter::ones(5, 3);
        assert_eq!(Variant::Direct.valid_region((9, 7), &f5), (2..7, 1..6));
        assert_eq!(Variant::Shifted.valid_region((9, 7), &f5), (2..7, 1..6));
        let f3 = Filter::from_3x3(&BOX_3X3);
        assert_eq!(Variant::Unrolled3x3Block.valid_region((4, 2), &f3), (1..3, 1..1));
        assert!(Variant::Direct.valid_region((3, 3), &f5).0.is_empty());
    }

    #[test]
    fn test_owned_columns_partition_interior() {
        let f = Filter::from_3x3(&BOX_3X3);
        for v in Variant::ALL {
            for n in 1..9 {
                let mut cols: Vec<usize> = Lane::all(n)
                    .flat_map(|lane| v.owned_columns(lane, 11, &f))
                    .collect();
                cols.sort_unstable();
                assert_eq!(cols, (1..10).collect::<Vec<_>>(), "{v} with {n} lanes");
            }
        }
    }

    #[test]
    fn test_idle_lanes() {
        let f = Filter::from_3x3(&BOX_3X3);
        // 3 interior columns
        assert_eq!(Variant::Direct.idle_lanes(8, 5, &f), 5);
        assert_eq!(Variant::Unrolled3x3Shifted.idle_lanes(8, 5, &f), 5);
        // block: 5 columns over 8 lanes puts the border columns on lanes 0 and 4
        assert_eq!(Variant::Unrolled3x3Block.idle_lanes(8, 5, &f), 5);
        assert_eq!(Variant::Direct.idle_lanes(2, 64, &f), 0);
    }
}
