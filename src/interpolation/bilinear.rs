//! Bilinear interpolation.
//!
//! This method performs linear interpolation in two dimensions using
//! the four nearest grid points.

use ndarray::{Array2, ArrayView2, Zip};

use super::common::linear_weight;
use super::Interpolator;
use crate::error::Result;

/// Bilinear interpolator
pub struct BilinearInterpolator;

impl Interpolator for BilinearInterpolator {
    fn interpolate(
        &self,
        zin: ArrayView2<f64>,
        xcoords: ArrayView2<f64>,
        ycoords: ArrayView2<f64>,
    ) -> Result<Array2<f64>> {
        let (ny, nx) = zin.dim();
        let mut out = Array2::zeros(xcoords.raw_dim());
        Zip::from(&mut out)
            .and(xcoords)
            .and(ycoords)
            .for_each(|o, &xc, &yc| {
                let xi = xc as usize;
                let yi = yc as usize;
                let xip1 = (xi + 1).min(nx - 1);
                let yip1 = (yi + 1).min(ny - 1);
                let (wx0, wx1) = linear_weight(xc - xi as f64);
                let (wy0, wy1) = linear_weight(yc - yi as f64);

                // All four terms are summed even at zero weight, so a NaN
                // neighbour poisons the result
                *o = wx0 * wy0 * zin[[yi, xi]]
                    + wx1 * wy1 * zin[[yip1, xip1]]
                    + wx0 * wy1 * zin[[yip1, xi]]
                    + wx1 * wy0 * zin[[yi, xip1]];
            });
        Ok(out)
    }

    fn name(&self) -> &str {
        "bilinear"
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
    fn test_bilinear_cell_centre_and_corner() {
        let zin = field();
        let xc = array![[0.5, 2.0]];
        let yc = array![[0.5, 2.0]];
        let out = BilinearInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        assert_eq!(out[[0, 0]], 3.0);
        assert_eq!(out[[0, 1]], 9.0);
    }

    #[test]
    fn test_bilinear_along_edges() {
        let zin = field();
        let xc = array![[1.25, 2.0]];
        let yc = array![[0.0, 1.5]];
        let out = BilinearInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        assert!((out[[0, 0]] - 2.25).abs() < 1e-12);
        assert!((out[[0, 1]] - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_bilinear_nan_neighbour_propagates() {
        let zin = array![[1.0, 2.0], [3.0, f64::NAN]];
        let out = BilinearInterpolator
            .interpolate(zin.view(), array![[0.0]].view(), array![[0.0]].view())
            .unwrap();
        assert!(out[[0, 0]].is_nan());
    }
}
