//! Up-front precondition check for a convolution call.
//!
//! Kernels trust their arguments. A driver that wants a readable failure
//! instead of a division fault or a wrong answer builds a `ConvProblem` and
//! validates it once, before any lane starts.

use std::ops::Range;

use tessera_core::{Filter, Image, Result, TesseraError};

use crate::dispatch::Variant;
use crate::weights::weight_sum;

#[derive(Debug, Clone, Copy)]
pub struct ConvProblem<'a> {
    pub input: &'a Image,
    pub filter: &'a Filter,
    pub output: &'a Image,
}

impl<'a> ConvProblem<'a> {
    pub fn new(input: &'a Image, filter: &'a Filter, output: &'a Image) -> Self {
        Self { input, filter, output }
    }

    /// Check every precondition `variant` relies on:
    ///
    /// - input and output are distinct buffers with equal dimensions
    /// - the filter has odd dimensions (3x3 for the unrolled variants)
    /// - the filter weights sum to a positive value
    /// - the filter fits inside the image
    pub fn validate(&self, variant: Variant) -> Result<()> {
        if self.input.same_buffer(self.output) {
            return Err(TesseraError::AliasedBuffers);
        }
        if self.input.dims() != self.output.dims() {
            return Err(TesseraError::DimMismatch {
                input: self.input.dims(),
                output: self.output.dims(),
            });
        }

        let (k_x, k_y) = (self.filter.width(), self.filter.height());
        if !self.filter.is_odd() {
            return Err(TesseraError::EvenKernel { width: k_x, height: k_y });
        }
        if variant.is_3x3() && self.filter.as_3x3().is_none() {
            return Err(TesseraError::KernelShape {
                variant: variant.name(),
                expected: "3x3",
                width: k_x,
                height: k_y,
            });
        }
        if weight_sum(self.filter.weights()) == 0 {
            return Err(TesseraError::ZeroWeightSum);
        }

        let (width, height) = self.input.dims();
        if k_x > width || k_y > height {
            return Err(TesseraError::KernelTooLarge {
                k_width: k_x,
                k_height: k_y,
                width,
                height,
            });
        }
        Ok(())
    }

    /// Output rectangle `(columns, rows)` that `variant` writes for this
    /// problem. Pixels outside it keep whatever `output` held before.
    pub fn valid_region(&self, variant: Variant) -> (Range<usize>, Range<usize>) {
        variant.valid_region(self.input.dims(), self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::GAUSSIAN_3X3;

    #[test]
    fn test_valid_problem() {
        let input = Image::zeros(8, 8);
        let output = Image::zeros(8, 8);
        let filter = Filter::from_3x3(&GAUSSIAN_3X3);
        for v in Variant::ALL {
            assert_eq!(ConvProblem::new(&input, &filter, &output).validate(v), Ok(()));
        }
    }

    #[test]
    fn test_aliased_buffers() {
        let img = Image::zeros(8, 8);
        let filter = Filter::ones(3, 3);
        let p = ConvProblem::new(&img, &filter, &img);
        assert_eq!(p.validate(Variant::Direct), Err(TesseraError::AliasedBuffers));
    }

    #[test]
    fn test_dim_mismatch() {
        let input = Image::zeros(8, 8);
        let output = Image::zeros(8, 7);
        let filter = Filter::ones(3, 3);
        let p = ConvProblem::new(&input, &filter, &output);
        assert!(matches!(p.validate(Variant::Direct), Err(TesseraError::DimMismatch { .. })));
    }

    #[test]
    fn test_filter_preconditions() {
        let input = Image::zeros(6, 6);
        let output = Image::zeros(6, 6);

        let even = Filter::ones(4, 3);
        assert_eq!(
            ConvProblem::new(&input, &even, &output).validate(Variant::Shifted),
            Err(TesseraError::EvenKernel { width: 4, height: 3 })
        );

        let zero = Filter::new(vec![0; 9], 3, 3).unwrap();
        assert_eq!(
            ConvProblem::new(&input, &zero, &output).validate(Variant::Direct),
            Err(TesseraError::ZeroWeightSum)
        );

        let big = Filter::ones(7, 1);
        assert!(matches!(
            ConvProblem::new(&input, &big, &output).validate(Variant::Direct),
            Err(TesseraError::KernelTooLarge { k_width: 7, .. })
        ));

        let five = Filter::ones(5, 5);
        assert!(matches!(
            ConvProblem::new(&input, &five, &output).validate(Variant::Unrolled3x3Block),
            Err(TesseraError::KernelShape { .. })
        ));
    }

    #[test]
    fn test_valid_region() {
        let input = Image::zeros(10, 7);
        let output = Image::zeros(10, 7);

        let five = Filter::ones(5, 3);
        let p = ConvProblem::new(&input, &five, &output);
        assert_eq!(p.valid_region(Variant::Direct), (2..8, 1..6));
        assert_eq!(p.valid_region(Variant::Shifted), (2..8, 1..6));

        let gauss = Filter::from_3x3(&GAUSSIAN_3X3);
        let p = ConvProblem::new(&input, &gauss, &output);
        for v in Variant::ALL {
            assert_eq!(p.valid_region(v), (1..9, 1..6), "{v}");
        }
    }
}
