//! Nearest neighbor interpolation.
//!
//! This method selects the value of the nearest grid point.
//! It's the simplest interpolation method, offering the fastest
//! performance but with less smooth results compared to higher-order methods.

use ndarray::{Array2, ArrayView2, Zip};

use super::Interpolator;
use crate::error::Result;

/// Nearest neighbor interpolator
pub struct NearestInterpolator;

impl Interpolator for NearestInterpolator {
    fn interpolate(
        &self,
        zin: ArrayView2<f64>,
        xcoords: ArrayView2<f64>,
        ycoords: ArrayView2<f64>,
    ) -> Result<Array2<f64>> {
        let mut out = Array2::zeros(xcoords.raw_dim());
        // Halves round to the even index
        Zip::from(&mut out)
            .and(xcoords)
            .and(ycoords)
            .for_each(|o, &xc, &yc| {
                let xi = xc.round_ties_even() as usize;
                let yi = yc.round_ties_even() as usize;
                *o = zin[[yi, xi]];
            });
        Ok(out)
    }

    fn name(&self) -> &str {
        "nearest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn field() -> Array2<f64> {
        array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]
    }

    #[test]
    fn test_nearest_exact_indices() {
        let zin = field();
        let xc = array![[0.0, 2.0], [0.0, 2.0]];
        let yc = array![[0.0, 0.0], [2.0, 2.0]];
        let out = NearestInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        assert_eq!(out, array![[1.0, 3.0], [7.0, 9.0]]);
    }

    #[test]
    fn test_nearest_fractional_indices() {
        let zin = field();
        let xc = array![[1.3, 1.7, 0.5, 1.5]];
        let yc = array![[0.7, 1.2, 0.0, 0.0]];
        let out = NearestInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        assert_eq!(out, array![[5.0, 6.0, 1.0, 3.0]]);
    }

    #[test]
    fn test_nearest_propagates_nan() {
        let zin = array![[f64::NAN, 2.0], [3.0, 4.0]];
        let out = NearestInterpolator
            .interpolate(zin.view(), array![[0.2]].view(), array![[0.1]].view())
            .unwrap();
        assert!(out[[0, 0]].is_nan());
    }
}
