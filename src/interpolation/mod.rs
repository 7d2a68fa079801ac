//! Regridding of rectilinear fields.
//!
//! A [`Regridder`] is built once for a source grid `(xin, yin)`. It maps each
//! output coordinate to a fractional source index through one
//! [`GridResampler`] per axis, then hands the index meshes to an
//! [`Interpolator`] kernel of the requested order.

pub mod bicubic;
pub mod bilinear;
pub mod common;
pub mod nearest;
pub mod resampler;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use tracing::{debug, warn};

use crate::error::{Result, SenorgeError};
use crate::grid::{crop_overlap, CoordinateGrid};
use crate::raster::NoDataMask;
use common::{clamp_index, is_outside, validate_axis};
pub use resampler::{GridResampler, IrregularGridResampler, UniformGridResampler};

/// Trait for interpolation kernels.
///
/// `xcoords` and `ycoords` are fractional source indices already clipped to
/// the source grid, and share one shape which is the shape of the result.
pub trait Interpolator {
    /// Interpolate `zin` at the given fractional indices
    fn interpolate(
        &self,
        zin: ArrayView2<f64>,
        xcoords: ArrayView2<f64>,
        ycoords: ArrayView2<f64>,
    ) -> Result<Array2<f64>>;

    /// Get the name of this interpolation method
    fn name(&self) -> &str;
}

/// Interpolation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationOrder {
    /// Order 0
    Nearest,
    /// Order 1
    #[default]
    Bilinear,
    /// Order 3
    Cubic,
}

impl TryFrom<u8> for InterpolationOrder {
    type Error = SenorgeError;

    fn try_from(order: u8) -> Result<Self> {
        match order {
            0 => Ok(InterpolationOrder::Nearest),
            1 => Ok(InterpolationOrder::Bilinear),
            3 => Ok(InterpolationOrder::Cubic),
            _ => Err(SenorgeError::InvalidOrder { order }),
        }
    }
}

/// Get the kernel for an interpolation order
pub fn get_interpolator(order: InterpolationOrder) -> Box<dyn Interpolator> {
    match order {
        InterpolationOrder::Nearest => Box::new(nearest::NearestInterpolator),
        InterpolationOrder::Bilinear => Box::new(bilinear::BilinearInterpolator),
        InterpolationOrder::Cubic => Box::new(bicubic::BicubicInterpolator),
    }
}

/// What to do with output points that fell outside the source grid
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MaskPolicy {
    /// Keep the clipped edge values, no mask
    #[default]
    None,
    /// Keep the clipped values and return the mask alongside
    Mask,
    /// Overwrite masked points with the given value
    Fill(f64),
}

/// Options for a regridding call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegridOptions {
    pub order: InterpolationOrder,
    /// Fail with `OutOfBounds` instead of clipping out-of-domain points
    pub checkbounds: bool,
    pub masked: MaskPolicy,
}

/// Result of a regridding call
#[derive(Debug, Clone, PartialEq)]
pub struct Regridded {
    /// Interpolated values, shaped like `xout`
    pub data: Array2<f64>,
    /// True where the output point lay outside the source grid
    /// (only with [`MaskPolicy::Mask`])
    pub mask: Option<Array2<bool>>,
}

/// Resamples fields defined on one source grid.
pub struct Regridder {
    xin: Array1<f64>,
    yin: Array1<f64>,
    x_axis: Box<dyn GridResampler>,
    y_axis: Box<dyn GridResampler>,
}

impl Regridder {
    /// Validate the source axes and choose a resampler per axis
    pub fn new(xin: ArrayView1<f64>, yin: ArrayView1<f64>) -> Result<Self> {
        validate_axis("xin", xin)?;
        validate_axis("yin", yin)?;

        let x_axis = resampler::select_resampler(xin);
        let y_axis = resampler::select_resampler(yin);
        debug!(
            nx = xin.len(),
            ny = yin.len(),
            x_strategy = x_axis.name(),
            y_strategy = y_axis.name(),
            "Built regridder"
        );

        Ok(Self {
            xin: xin.to_owned(),
            yin: yin.to_owned(),
            x_axis,
            y_axis,
        })
    }

    /// Source grid shape as (rows, cols)
    pub fn source_shape(&self) -> (usize, usize) {
        (self.y_axis.len(), self.x_axis.len())
    }

    /// Resample `zin` (shape `(yin.len(), xin.len())`) at `(xout, yout)`
    pub fn regrid(
        &self,
        zin: ArrayView2<f64>,
        xout: ArrayView2<f64>,
        yout: ArrayView2<f64>,
        options: &RegridOptions,
    ) -> Result<Regridded> {
        if zin.dim() != self.source_shape() {
            return Err(SenorgeError::shape_mismatch(
                self.source_shape(),
                zin.dim(),
                "regrid: zin against (yin, xin)",
            ));
        }
        if xout.dim() != yout.dim() {
            return Err(SenorgeError::shape_mismatch(
                xout.dim(),
                yout.dim(),
                "regrid: yout against xout",
            ));
        }
        if options.checkbounds {
            check_bounds("x", self.xin.view(), xout)?;
            check_bounds("y", self.yin.view(), yout)?;
        }

        let (mut xcoords, mut ycoords) = self.fractional_indices(xout, yout);

        let (ny, nx) = self.source_shape();
        let mask = match options.masked {
            MaskPolicy::None => None,
            _ => {
                let mut mask = Array2::from_elem(xcoords.raw_dim(), false);
                Zip::from(&mut mask)
                    .and(&xcoords)
                    .and(&ycoords)
                    .for_each(|m, &xc, &yc| *m = is_outside(xc, nx) || is_outside(yc, ny));
                Some(mask)
            }
        };

        xcoords.mapv_inplace(|v| clamp_index(v, nx));
        ycoords.mapv_inplace(|v| clamp_index(v, ny));

        let kernel = get_interpolator(options.order);
        let mut data = kernel.interpolate(zin, xcoords.view(), ycoords.view())?;

        let mask = match (options.masked, mask) {
            (MaskPolicy::Fill(value), Some(mask)) => {
                Zip::from(&mut data).and(&mask).for_each(|d, &m| {
                    if m {
                        *d = value;
                    }
                });
                None
            }
            (_, mask) => mask,
        };

        debug!(
            method = kernel.name(),
            rows = data.nrows(),
            cols = data.ncols(),
            "Regridded field"
        );
        Ok(Regridded { data, mask })
    }

    /// Unclipped fractional source indices of every output point
    pub fn fractional_indices(
        &self,
        xout: ArrayView2<f64>,
        yout: ArrayView2<f64>,
    ) -> (Array2<f64>, Array2<f64>) {
        let xcoords = xout.mapv(|x| self.x_axis.fractional_index(x));
        let ycoords = yout.mapv(|y| self.y_axis.fractional_index(y));
        (xcoords, ycoords)
    }
}

fn check_bounds(name: &str, axis: ArrayView1<f64>, out: ArrayView2<f64>) -> Result<()> {
    let (lo, hi) = (axis[0], axis[axis.len() - 1]);
    let (min, max) = out
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| {
            (a.min(v), b.max(v))
        });
    if min < lo || max > hi {
        return Err(SenorgeError::OutOfBounds {
            message: format!(
                "{}out range [{}, {}] exceeds {}in range [{}, {}]",
                name, min, max, name, lo, hi
            ),
        });
    }
    Ok(())
}

/// Resample `zin`, defined on `(xin, yin)`, at `(xout, yout)`
pub fn interp(
    zin: ArrayView2<f64>,
    xin: ArrayView1<f64>,
    yin: ArrayView1<f64>,
    xout: ArrayView2<f64>,
    yout: ArrayView2<f64>,
    options: &RegridOptions,
) -> Result<Regridded> {
    Regridder::new(xin, yin)?.regrid(zin, xout, yout, options)
}

/// Bring a native model field onto the seNorge mesh.
///
/// The source is first cropped to the target extent (when it brackets it),
/// then sampled by nearest neighbour with strict bounds. Cells flagged by
/// `mask` become NaN. The result is south-up like the target mesh, so a
/// north-up mask is flipped before use.
pub fn regrid_to_senorge(
    zin: ArrayView2<f64>,
    xin: ArrayView1<f64>,
    yin: ArrayView1<f64>,
    target: &CoordinateGrid,
    mask: Option<&NoDataMask>,
) -> Result<Array2<f64>> {
    let cropped = match crop_overlap(xin, yin, zin, target) {
        Ok(cropped) => Some(cropped),
        Err(SenorgeError::OutOfBounds { message }) => {
            warn!(reason = %message, "Source not cropped");
            None
        }
        Err(e) => return Err(e),
    };
    let (xout, yout) = target.target_mesh();
    let options = RegridOptions {
        order: InterpolationOrder::Nearest,
        checkbounds: true,
        masked: MaskPolicy::None,
    };
    let regridded = match &cropped {
        Some(c) => interp(
            c.z.view(),
            c.x.view(),
            c.y.view(),
            xout.view(),
            yout.view(),
            &options,
        )?,
        None => interp(zin, xin, yin, xout.view(), yout.view(), &options)?,
    };
    let mut data = regridded.data;

    if let Some(mask) = mask {
        let flipped = mask.flipud();
        if flipped.shape() != data.dim() {
            return Err(SenorgeError::shape_mismatch(
                data.dim(),
                flipped.shape(),
                "regrid_to_senorge: mask",
            ));
        }
        Zip::from(&mut data).and(flipped.view()).for_each(|d, &m| {
            if m {
                *d = f64::NAN;
            }
        });
    }
    Ok(data)
}
