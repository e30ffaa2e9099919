//! Integer convolution kernels (filters).
//!
//! Weights are unsigned and stored row-major. Kernels are expected to have
//! odd dimensions so a center element exists, and a positive weight sum so
//! the normalization divisor is non-zero. Neither is enforced here.

use crate::{Result, TesseraError};

/// Fixed 3x3 kernel for the unrolled variants, row-major.
pub type Filter3x3 = [u32; 9];

/// Passes the center pixel through unchanged (weight sum 1).
pub const IDENTITY_3X3: Filter3x3 = [0, 0, 0, 0, 1, 0, 0, 0, 0];

/// Plain 3x3 mean.
pub const BOX_3X3: Filter3x3 = [1; 9];

/// 3x3 binomial blur (weight sum 16). Its output on the init pattern is
/// what the image verifier checks for.
pub const GAUSSIAN_3X3: Filter3x3 = [1, 2, 1, 2, 4, 2, 1, 2, 1];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    weights: Vec<u32>,
    width: usize,
    height: usize,
}

impl Filter {
    /// Wrap row-major weights. `weights.len()` must equal `width * height`.
    pub fn new(weights: Vec<u32>, width: usize, height: usize) -> Result<Self> {
        let expected = width * height;
        if weights.len() != expected {
            return Err(TesseraError::BufferLength {
                width,
                height,
                expected,
                got: weights.len(),
            });
        }
        Ok(Self { weights, width, height })
    }

    /// All-ones kernel: a truncating mean over the window.
    pub fn ones(width: usize, height: usize) -> Self {
        Self {
            weights: vec![1; width * height],
            width,
            height,
        }
    }

    pub fn from_3x3(k: &Filter3x3) -> Self {
        Self {
            weights: k.to_vec(),
            width: 3,
            height: 3,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    #[inline]
    pub fn weight(&self, n: usize, m: usize) -> u32 {
        self.weights[m * self.width + n]
    }

    /// Columns left unwritten on each side: `width / 2`.
    pub fn boundary_x(&self) -> usize {
        self.width / 2
    }

    /// Rows left unwritten on each side: `height / 2`.
    pub fn boundary_y(&self) -> usize {
        self.height / 2
    }

    pub fn is_odd(&self) -> bool {
        self.width % 2 == 1 && self.height % 2 == 1
    }

    /// View as a fixed 3x3 kernel, if it is one.
    pub fn as_3x3(&self) -> Option<&Filter3x3> {
        if self.width != 3 || self.height != 3 {
            return None;
        }
        self.weights.as_slice().try_into().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(Filter::new(vec![1; 9], 3, 3).is_ok());
        assert!(matches!(
            Filter::new(vec![1; 8], 3, 3),
            Err(TesseraError::BufferLength { expected: 9, got: 8, .. })
        ));
    }

    #[test]
    fn test_boundaries() {
        let f = Filter::ones(5, 3);
        assert_eq!(f.boundary_x(), 2);
        assert_eq!(f.boundary_y(), 1);
        assert!(f.is_odd());
        assert!(!Filter::ones(4, 3).is_odd());
    }

    #[test]
    fn test_as_3x3() {
        let f = Filter::from_3x3(&GAUSSIAN_3X3);
        assert_eq!(f.as_3x3(), Some(&GAUSSIAN_3X3));
        assert_eq!(f.weight(1, 1), 4);
        assert_eq!(f.weight(2, 0), 1);
        assert!(Filter::ones(5, 5).as_3x3().is_none());
        assert!(Filter::ones(9, 1).as_3x3().is_none());
    }
}
