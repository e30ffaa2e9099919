//! Normalization divisor.
//!
//! Every lane sums the weights itself on every call. Nothing is cached or
//! shared, so no lane ever waits on another.

/// Sum of all kernel weights.
///
/// Must be positive for a kernel call; a zero sum faults on the divide.
#[inline]
pub fn weight_sum(weights: &[u32]) -> u32 {
    weights.iter().sum()
}

/// Scale a raw weighted sum back into pixel range. Truncates toward zero.
///
/// `acc` must be a sum of `i32` pixels times non-negative weights summing to
/// `weight`. The quotient is then a weighted mean of `i32` values and always
/// lies within `i32`, so the final narrowing is exact.
#[inline]
pub fn normalize(acc: i64, weight: u32) -> i32 {
    let mean = acc / i64::from(weight);
    debug_assert!(
        i32::try_from(mean).is_ok(),
        "weighted mean {mean} out of pixel range (acc {acc}, weight {weight})"
    );
    mean as i32
}
