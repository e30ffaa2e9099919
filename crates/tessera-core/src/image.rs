//! Row-major `i32` image shared between lanes.
//!
//! Elements are `AtomicI32` so that any number of lanes can hold `&Image`
//! and store into disjoint elements at once. All accesses use
//! `Ordering::Relaxed`; visibility across lanes comes from the barrier the
//! caller runs between phases, not from the image itself.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::{Result, TesseraError};

pub struct Image {
    data: Box<[AtomicI32]>,
    width: usize,
    height: usize,
}

impl Image {
    /// Allocate a zero-filled `width x height` image.
    pub fn zeros(width: usize, height: usize) -> Self {
        let data = (0..width * height).map(|_| AtomicI32::new(0)).collect();
        Self { data, width, height }
    }

    /// Wrap row-major values. `values.len()` must equal `width * height`.
    pub fn from_vec(values: Vec<i32>, width: usize, height: usize) -> Result<Self> {
        let expected = width * height;
        if values.len() != expected {
            return Err(TesseraError::BufferLength {
                width,
                height,
                expected,
                got: values.len(),
            });
        }
        let data = values.into_iter().map(AtomicI32::new).collect();
        Ok(Self { data, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear index of column `x`, row `y`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.get_linear(self.index(x, y))
    }

    #[inline]
    pub fn set(&self, x: usize, y: usize, value: i32) {
        self.set_linear(self.index(x, y), value);
    }

    #[inline]
    pub fn get_linear(&self, idx: usize) -> i32 {
        self.data[idx].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_linear(&self, idx: usize, value: i32) {
        self.data[idx].store(value, Ordering::Relaxed);
    }

    /// Snapshot of all values in row-major order.
    pub fn to_vec(&self) -> Vec<i32> {
        self.data.iter().map(|v| v.load(Ordering::Relaxed)).collect()
    }

    /// Copy of one row.
    pub fn row(&self, y: usize) -> Vec<i32> {
        let start = self.index(0, y);
        self.data[start..start + self.width]
            .iter()
            .map(|v| v.load(Ordering::Relaxed))
            .collect()
    }

    /// Whether `self` and `other` are the same allocation.
    pub fn same_buffer(&self, other: &Image) -> bool {
        std::ptr::eq(self.data.as_ptr(), other.data.as_ptr())
    }
}

impl Clone for Image {
    fn clone(&self) -> Self {
        let data = self
            .data
            .iter()
            .map(|v| AtomicI32::new(v.load(Ordering::Relaxed)))
            .collect();
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image({}x{})", self.width, self.height)?;
        if self.len() <= 64 {
            for y in 0..self.height {
                write!(f, "\n  {:?}", self.row(y))?;
            }
        }
        Ok(())
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.to_vec() == other.to_vec()
    }
}

impl Eq for Image {}
