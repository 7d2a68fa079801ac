//! Test data generation utilities.
//!
//! Synthetic theme rasters with known values, written through the crate's
//! own codecs so the integration tests start from real files on disk.

use ndarray::{Array1, Array2};
use std::path::{Path, PathBuf};

use senorge::grid::UtmProjection;
use senorge::{BilCodec, CoordinateGrid, DataType, NoDataMask, RasterGrid, Result};

/// A uint16 theme field with a repeating ramp and a few missing cells.
///
/// Values stay below 1000 so they survive the cast to int16.
pub fn ramp_field(shape: (usize, usize)) -> RasterGrid {
    let mut data = Array2::from_shape_fn(shape, |(j, i)| ((j % 100) * 10 + i % 10) as f64);
    data[[0, 0]] = 65535.0;
    data[[shape.0 - 1, shape.1 - 1]] = 65535.0;
    RasterGrid::from_array(data, DataType::Uint16)
}

/// Write `grid` as `<dir>/<theme>_<date>.bil` and return the path
pub fn write_bil_theme(dir: &Path, theme: &str, date: &str, grid: &RasterGrid) -> Result<PathBuf> {
    let path = dir.join(format!("{}_{}.bil", theme, date));
    BilCodec::with_shape(grid.shape()).write(grid, &path, grid.dtype().clone(), None)?;
    Ok(path)
}

/// A north-up mask covering the `rows` x `cols` block in the north-west corner
pub fn corner_mask(shape: (usize, usize), rows: usize, cols: usize) -> NoDataMask {
    NoDataMask::from_array(Array2::from_shape_fn(shape, |(j, i)| j < rows && i < cols))
}

/// A 4 x 3 cell UTM-33 grid at 1 km spacing
pub fn small_grid() -> CoordinateGrid {
    CoordinateGrid {
        lower_left: (0.0, 6_600_000.0),
        upper_right: (4000.0, 6_603_000.0),
        cell_size: (1000.0, 1000.0),
        projection: UtmProjection::utm33(),
    }
}

/// A model field on a 500 m grid around [`small_grid`], linear in both
/// directions: `z = x / 1000 + 10 * (y - 6_600_000) / 1000`
pub fn model_field() -> (Array1<f64>, Array1<f64>, Array2<f64>) {
    let x = Array1::from_shape_fn(13, |i| -1000.0 + 500.0 * i as f64);
    let y = Array1::from_shape_fn(11, |j| 6_599_000.0 + 500.0 * j as f64);
    let z = Array2::from_shape_fn((y.len(), x.len()), |(j, i)| {
        x[i] / 1000.0 + 10.0 * (y[j] - 6_600_000.0) / 1000.0
    });
    (x, y, z)
}
