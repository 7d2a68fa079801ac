//! Assertion utilities for testing.
//!
//! Floating-point comparisons that treat NaN as equal to NaN, since missing
//! cells are carried as NaN through the regridding pipeline.

use ndarray::ArrayView2;

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two values are approximately equal, or both NaN.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    if actual.is_nan() && expected.is_nan() {
        return;
    }
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that two grids have the same shape and are element-wise
/// approximately equal.
///
/// # Panics
///
/// Panics on a shape difference or on the first differing cell.
pub fn assert_grid_approx_eq(actual: ArrayView2<f64>, expected: ArrayView2<f64>, epsilon: Option<f64>) {
    assert_eq!(
        actual.dim(),
        expected.dim(),
        "Grids have different shapes: actual = {:?}, expected = {:?}",
        actual.dim(),
        expected.dim()
    );

    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    for ((idx, a), e) in actual.indexed_iter().zip(expected.iter()) {
        if a.is_nan() && e.is_nan() {
            continue;
        }
        let diff = (a - e).abs();
        assert!(
            diff <= eps,
            "Grids differ at {:?}: actual = {}, expected = {}, diff = {}, epsilon = {}",
            idx,
            a,
            e,
            diff,
            eps
        );
    }
}

/// Assert that a value is within `[min, max]`.
pub fn assert_in_range(actual: f64, min: f64, max: f64) {
    assert!(
        actual >= min && actual <= max,
        "Value not in range: actual = {}, min = {}, max = {}",
        actual,
        min,
        max
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0, None);
        assert_approx_eq(1.0, 1.001, Some(0.01));
        assert_approx_eq(f64::NAN, f64::NAN, None);
    }

    #[test]
    fn test_assert_grid_approx_eq() {
        let a = array![[1.0, f64::NAN], [3.0, 4.0]];
        let b = array![[1.0, f64::NAN], [3.0, 4.0000000001]];
        assert_grid_approx_eq(a.view(), b.view(), None);
    }

    #[test]
    fn test_assert_in_range() {
        assert_in_range(5.0, 0.0, 10.0);
        assert_in_range(10.0, 0.0, 10.0);
    }
}
