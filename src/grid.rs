//! The seNorge target grid and its geographic projection.
//!
//! The national grid is a regular 1 km mesh in UTM zone 33 (WGS84) spanning
//! easting -75 000..1 120 000 m and northing 6 450 000..8 000 000 m, which
//! yields 1195 columns and 1550 rows. Axes are half-open, like `arange`.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SenorgeError};

/// Default seNorge grid width (columns, x)
pub const SENORGE_WIDTH: usize = 1195;

/// Default seNorge grid height (rows, y)
pub const SENORGE_HEIGHT: usize = 1550;

/// PROJ.4 definition of the seNorge grid projection
pub const UTM33_PROJ4: &str = "+proj=utm +zone=33 +ellps=WGS84 +datum=WGS84 +units=m +no_defs";

/// PROJ.4 definition of geographic WGS84 coordinates
pub const LONGLAT_PROJ4: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Parameters of a transverse Mercator UTM projection on an ellipsoid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtmProjection {
    pub zone: u8,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub latitude_of_origin: f64,
    pub central_meridian: f64,
    pub semi_major_axis: f64,
    pub semi_minor_axis: f64,
}

impl UtmProjection {
    /// UTM zone 33 on WGS84
    pub fn utm33() -> Self {
        Self {
            zone: 33,
            scale_factor: 0.9996,
            false_easting: 500_000.0,
            latitude_of_origin: 0.0,
            central_meridian: 15.0,
            semi_major_axis: 6_378_137.0,
            semi_minor_axis: 6_356_752.3142,
        }
    }

    /// The PROJ.4 string handed to the projection library
    pub fn proj4(&self) -> String {
        if *self == Self::utm33() {
            UTM33_PROJ4.to_string()
        } else {
            format!(
                "+proj=utm +zone={} +a={} +b={} +units=m +no_defs",
                self.zone, self.semi_major_axis, self.semi_minor_axis
            )
        }
    }
}

/// A regular rectilinear grid in projected coordinates.
///
/// Immutable once built; `x` has `width` entries and `y` has `height`
/// entries, both increasing in steps of the cell size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateGrid {
    /// Lower left corner (easting, northing) in meters
    pub lower_left: (f64, f64),
    /// Upper right corner (easting, northing) in meters, exclusive
    pub upper_right: (f64, f64),
    /// Cell size (dx, dy) in meters
    pub cell_size: (f64, f64),
    /// Projection of the coordinates
    pub projection: UtmProjection,
}

impl Default for CoordinateGrid {
    fn default() -> Self {
        Self::senorge()
    }
}

impl CoordinateGrid {
    /// The national seNorge 1x1 km grid
    pub fn senorge() -> Self {
        Self {
            lower_left: (-75_000.0, 6_450_000.0),
            upper_right: (1_120_000.0, 8_000_000.0),
            cell_size: (1000.0, 1000.0),
            projection: UtmProjection::utm33(),
        }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        axis_len(self.lower_left.0, self.upper_right.0, self.cell_size.0)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        axis_len(self.lower_left.1, self.upper_right.1, self.cell_size.1)
    }

    /// Shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// 1-D x (easting) and y (northing) axes
    pub fn target_axes(&self) -> (Array1<f64>, Array1<f64>) {
        let (x0, y0) = self.lower_left;
        let (dx, dy) = self.cell_size;
        let x = Array1::from_shape_fn(self.width(), |i| x0 + i as f64 * dx);
        let y = Array1::from_shape_fn(self.height(), |j| y0 + j as f64 * dy);
        (x, y)
    }

    /// 2-D broadcast of the axes, each of shape (height, width)
    pub fn target_mesh(&self) -> (Array2<f64>, Array2<f64>) {
        let (x, y) = self.target_axes();
        meshgrid(x.view(), y.view())
    }

    /// Inverse-project a mesh of grid coordinates to (lon, lat) in degrees
    pub fn to_lonlat(
        &self,
        xgrid: ArrayView2<f64>,
        ygrid: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        if xgrid.dim() != ygrid.dim() {
            return Err(SenorgeError::shape_mismatch(
                xgrid.dim(),
                ygrid.dim(),
                "to_lonlat: xgrid and ygrid",
            ));
        }

        let projector = Projector::new(&self.projection)?;
        let mut lon = Array2::zeros(xgrid.dim());
        let mut lat = Array2::zeros(xgrid.dim());
        for ((idx, &x), &y) in xgrid.indexed_iter().zip(ygrid.iter()) {
            let (lo, la) = projector.inverse(x, y)?;
            lon[idx] = lo;
            lat[idx] = la;
        }

        debug!(
            rows = xgrid.nrows(),
            cols = xgrid.ncols(),
            proj = %self.projection.proj4(),
            "Projected grid to lon/lat"
        );
        Ok((lon, lat))
    }
}

/// Number of samples in the half-open range `start..stop` with step `step`
fn axis_len(start: f64, stop: f64, step: f64) -> usize {
    ((stop - start) / step).ceil().max(0.0) as usize
}

/// 2-D coordinate matrices from 1-D axes, `(ny, nx)` each
pub fn meshgrid(x: ArrayView1<f64>, y: ArrayView1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (y.len(), x.len());
    let xgrid = Array2::from_shape_fn(shape, |(_, i)| x[i]);
    let ygrid = Array2::from_shape_fn(shape, |(j, _)| y[j]);
    (xgrid, ygrid)
}

/// Wraps the projection library for UTM <-> lon/lat
pub struct Projector {
    utm: Proj,
    longlat: Proj,
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector").finish_non_exhaustive()
    }
}

impl Projector {
    /// Build a projector for the given UTM parameters
    pub fn new(projection: &UtmProjection) -> Result<Self> {
        let definition = projection.proj4();
        let utm = Proj::from_proj_string(&definition).map_err(|e| SenorgeError::Projection {
            message: format!("Invalid projection '{}': {:?}", definition, e),
        })?;
        let longlat =
            Proj::from_proj_string(LONGLAT_PROJ4).map_err(|e| SenorgeError::Projection {
                message: format!("Invalid projection '{}': {:?}", LONGLAT_PROJ4, e),
            })?;
        Ok(Self { utm, longlat })
    }

    /// UTM (easting, northing) in meters to (lon, lat) in degrees
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut point = (x, y, 0.0);
        transform(&self.utm, &self.longlat, &mut point).map_err(|e| {
            SenorgeError::Projection {
                message: format!("Inverse projection of ({}, {}) failed: {:?}", x, y, e),
            }
        })?;
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }

    /// (lon, lat) in degrees to UTM (easting, northing) in meters
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&self.longlat, &self.utm, &mut point).map_err(|e| {
            SenorgeError::Projection {
                message: format!("Forward projection of ({}, {}) failed: {:?}", lon, lat, e),
            }
        })?;
        Ok((point.0, point.1))
    }
}

/// Source axes and field cropped to the target extent
#[derive(Debug, Clone)]
pub struct CroppedGrid {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array2<f64>,
}

/// Crop a source grid to the smallest sub-grid that still brackets `target`.
///
/// Keeps the last source coordinate below the target minimum and the first
/// one above the target maximum on each axis, so that interpolation at the
/// target edges has neighbours on both sides. Fails with `OutOfBounds` when
/// the source does not extend beyond the target on every side, and with
/// `InvalidGrid` when the target has no cells.
pub fn crop_overlap(
    xin: ArrayView1<f64>,
    yin: ArrayView1<f64>,
    zin: ArrayView2<f64>,
    target: &CoordinateGrid,
) -> Result<CroppedGrid> {
    if zin.dim() != (yin.len(), xin.len()) {
        return Err(SenorgeError::shape_mismatch(
            (yin.len(), xin.len()),
            zin.dim(),
            "crop_overlap: zin against (yin, xin)",
        ));
    }

    if target.width() == 0 || target.height() == 0 {
        return Err(SenorgeError::InvalidGrid {
            message: format!("target grid is empty: {:?}", target.shape()),
        });
    }

    let (xt, yt) = target.target_axes();
    let (x0, x1) = bracket(xin, xt[0], xt[xt.len() - 1], "x")?;
    let (y0, y1) = bracket(yin, yt[0], yt[yt.len() - 1], "y")?;

    Ok(CroppedGrid {
        x: xin.slice(ndarray::s![x0..=x1]).to_owned(),
        y: yin.slice(ndarray::s![y0..=y1]).to_owned(),
        z: zin.slice(ndarray::s![y0..=y1, x0..=x1]).to_owned(),
    })
}

fn bracket(axis: ArrayView1<f64>, min: f64, max: f64, name: &str) -> Result<(usize, usize)> {
    let lower = axis.iter().rposition(|&v| v < min);
    let upper = axis.iter().position(|&v| v > max);
    match (lower, upper) {
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(SenorgeError::OutOfBounds {
            message: format!(
                "source {} axis does not bracket target range [{}, {}]",
                name, min, max
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    #[test]
    fn test_senorge_axes() {
        let grid = CoordinateGrid::senorge();
        assert_eq!(grid.shape(), (SENORGE_HEIGHT, SENORGE_WIDTH));

        let (x, y) = grid.target_axes();
        assert_eq!(x.len(), 1195);
        assert_eq!(y.len(), 1550);
        assert_eq!(x[0], -75_000.0);
        assert_eq!(x[1194], 1_119_000.0);
        assert_eq!(y[0], 6_450_000.0);
        assert_eq!(y[1549], 7_999_000.0);
        assert!(x.windows(2).into_iter().all(|w| w[1] - w[0] == 1000.0));
    }

    #[test]
    fn test_meshgrid_layout() {
        let x = Array::from(vec![0.0, 1.0, 2.0]);
        let y = Array::from(vec![10.0, 20.0]);
        let (xg, yg) = meshgrid(x.view(), y.view());
        assert_eq!(xg.dim(), (2, 3));
        assert_eq!(xg[[1, 2]], 2.0);
        assert_eq!(yg[[1, 2]], 20.0);
        assert_eq!(yg[[0, 0]], 10.0);
    }

    #[test]
    fn test_inverse_projection_central_meridian() {
        let projector = Projector::new(&UtmProjection::utm33()).unwrap();
        // Easting 500 km lies on the central meridian of zone 33
        let (lon, lat) = projector.inverse(500_000.0, 6_650_000.0).unwrap();
        assert!((lon - 15.0).abs() < 1e-6, "lon = {}", lon);
        assert!(lat > 59.0 && lat < 61.0, "lat = {}", lat);
    }

    #[test]
    fn test_projection_round_trip() {
        let projector = Projector::new(&UtmProjection::utm33()).unwrap();
        let (x, y) = projector.forward(10.75, 59.91).unwrap();
        let (lon, lat) = projector.inverse(x, y).unwrap();
        assert!((lon - 10.75).abs() < 1e-6);
        assert!((lat - 59.91).abs() < 1e-6);
    }

    #[test]
    fn test_to_lonlat_small_mesh() {
        let grid = CoordinateGrid::senorge();
        let x = Array::from(vec![400_000.0, 500_000.0]);
        let y = Array::from(vec![7_000_000.0]);
        let (xg, yg) = meshgrid(x.view(), y.view());
        let (lon, lat) = grid.to_lonlat(xg.view(), yg.view()).unwrap();
        assert_eq!(lon.dim(), (1, 2));
        assert!(lon[[0, 0]] < lon[[0, 1]]);
        assert!((lat[[0, 0]] - lat[[0, 1]]).abs() < 0.2);
    }

    #[test]
    fn test_crop_overlap() {
        let target = CoordinateGrid {
            lower_left: (0.0, 0.0),
            upper_right: (4.0, 4.0),
            cell_size: (1.0, 1.0),
            projection: UtmProjection::utm33(),
        };
        let xin = Array::linspace(-5.0, 10.0, 16);
        let yin = Array::linspace(-5.0, 10.0, 16);
        let zin = Array2::from_shape_fn((16, 16), |(j, i)| (j * 16 + i) as f64);

        let cropped = crop_overlap(xin.view(), yin.view(), zin.view(), &target).unwrap();
        assert_eq!(cropped.x.to_vec(), vec![-1.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(cropped.z.dim(), (6, 6));
        assert_eq!(cropped.z[[0, 0]], zin[[4, 4]]);

        let narrow = Array::linspace(1.0, 2.0, 2);
        let err = crop_overlap(narrow.view(), yin.view(), zin.slice(ndarray::s![.., ..2]), &target);
        assert!(matches!(err, Err(SenorgeError::OutOfBounds { .. })));
    }

    #[test]
    fn test_crop_overlap_empty_target() {
        let target = CoordinateGrid {
            lower_left: (0.0, 0.0),
            upper_right: (0.0, 0.0),
            cell_size: (1.0, 1.0),
            projection: UtmProjection::utm33(),
        };
        let xin = Array::linspace(-5.0, 10.0, 16);
        let zin = Array2::<f64>::zeros((16, 16));
        let err = crop_overlap(xin.view(), xin.view(), zin.view(), &target);
        assert!(matches!(err, Err(SenorgeError::InvalidGrid { .. })));
    }
}
