//! Bicubic interpolation.
//!
//! Delegates to the multicubic Hermite spline of the `interpn` crate,
//! evaluated in index space (start 0, step 1) so that irregular source axes
//! are handled by the same fractional-index mapping as the other orders.
//! Needs at least 4 source points per axis. NaN in the source is not
//! guaranteed to propagate.

use ndarray::{Array2, ArrayView2};

use super::Interpolator;
use crate::error::{Result, SenorgeError};

/// Bicubic interpolator
pub struct BicubicInterpolator;

impl Interpolator for BicubicInterpolator {
    fn interpolate(
        &self,
        zin: ArrayView2<f64>,
        xcoords: ArrayView2<f64>,
        ycoords: ArrayView2<f64>,
    ) -> Result<Array2<f64>> {
        let (ny, nx) = zin.dim();
        let vals = zin.as_standard_layout();
        let vals = vals.as_slice().ok_or_else(|| SenorgeError::Interpolation {
            message: "source field is not contiguous".to_string(),
        })?;

        let ys: Vec<f64> = ycoords.iter().copied().collect();
        let xs: Vec<f64> = xcoords.iter().copied().collect();
        let mut out = vec![0.0; xs.len()];

        interpn::multicubic::regular::interpn(
            &[ny, nx],
            &[0.0, 0.0],
            &[1.0, 1.0],
            vals,
            false,
            &[ys.as_slice(), xs.as_slice()],
            &mut out,
        )
        .map_err(|e| SenorgeError::Interpolation {
            message: e.to_string(),
        })?;

        Ok(Array2::from_shape_vec(xcoords.raw_dim(), out)?)
    }

    fn name(&self) -> &str {
        "bicubic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bicubic_reproduces_nodes() {
        let zin = Array2::from_shape_fn((5, 6), |(j, i)| (j * 6 + i) as f64);
        let xc = Array2::from_shape_fn((5, 6), |(_, i)| i as f64);
        let yc = Array2::from_shape_fn((5, 6), |(j, _)| j as f64);
        let out = BicubicInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        for (a, b) in out.iter().zip(zin.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bicubic_exact_for_linear_field() {
        let zin = Array2::from_shape_fn((4, 4), |(j, i)| 2.0 * i as f64 + 3.0 * j as f64);
        let xc = ndarray::array![[0.5, 1.25, 2.9]];
        let yc = ndarray::array![[0.5, 2.5, 1.1]];
        let out = BicubicInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        for k in 0..3 {
            let expected = 2.0 * xc[[0, k]] + 3.0 * yc[[0, k]];
            assert!((out[[0, k]] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bicubic_on_grid_edges() {
        let zin = Array2::from_shape_fn((4, 5), |(j, i)| 2.0 * i as f64 - j as f64);
        let xc = ndarray::array![[0.0, 4.0, 4.0, 3.5]];
        let yc = ndarray::array![[0.0, 3.0, 0.0, 2.75]];
        let out = BicubicInterpolator
            .interpolate(zin.view(), xc.view(), yc.view())
            .unwrap();
        for k in 0..4 {
            let expected = 2.0 * xc[[0, k]] - yc[[0, k]];
            assert!((out[[0, k]] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bicubic_needs_four_points() {
        let zin = Array2::<f64>::zeros((3, 3));
        let result = BicubicInterpolator.interpolate(
            zin.view(),
            ndarray::array![[1.0]].view(),
            ndarray::array![[1.0]].view(),
        );
        assert!(matches!(result, Err(SenorgeError::Interpolation { .. })));
    }
}
