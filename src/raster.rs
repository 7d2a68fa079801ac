//! In-memory raster grids and the Norway no-data mask.

use ndarray::{s, Array2, ArrayView2, Zip};
use std::path::Path;
use tracing::debug;

use crate::bil::BilCodec;
use crate::dtype::DataType;
use crate::error::{Result, SenorgeError};
use crate::fill::FillValuePolicy;
use crate::grid::{SENORGE_HEIGHT, SENORGE_WIDTH};

/// A 2-D raster of values destined for a given storage type.
///
/// Values are held as `f64`. Before quantization a missing cell is NaN;
/// once [`RasterGrid::fill_missing`] or [`RasterGrid::apply_mask`] ran it
/// carries the sentinel of `dtype` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    dtype: DataType,
    data: Array2<f64>,
}

impl RasterGrid {
    /// A grid of `(height, width)` cells all set to `value`
    pub fn filled(height: usize, width: usize, dtype: DataType, value: f64) -> Self {
        Self {
            dtype,
            data: Array2::from_elem((height, width), value),
        }
    }

    /// A seNorge-sized grid (1550 x 1195) of zeros
    pub fn senorge(dtype: DataType) -> Self {
        Self::filled(SENORGE_HEIGHT, SENORGE_WIDTH, dtype, 0.0)
    }

    /// Wrap an existing array
    pub fn from_array(data: Array2<f64>, dtype: DataType) -> Self {
        Self { dtype, data }
    }

    /// Wrap an existing array, checking it against an explicit shape
    pub fn with_shape(data: Array2<f64>, dtype: DataType, shape: (usize, usize)) -> Result<Self> {
        if data.dim() != shape {
            return Err(SenorgeError::shape_mismatch(
                shape,
                data.dim(),
                "RasterGrid::with_shape",
            ));
        }
        Ok(Self { dtype, data })
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    /// The sentinel currently in force for this grid
    pub fn fill_sentinel(&self, policy: &FillValuePolicy) -> f64 {
        policy.sentinel_for(&self.dtype)
    }

    /// Set every cell where `mask` is true to the sentinel of this grid's type
    pub fn apply_mask(&mut self, mask: &NoDataMask, policy: &FillValuePolicy) -> Result<()> {
        if mask.shape() != self.shape() {
            return Err(SenorgeError::shape_mismatch(
                self.shape(),
                mask.shape(),
                "apply_mask",
            ));
        }
        let sentinel = self.fill_sentinel(policy);
        Zip::from(&mut self.data)
            .and(mask.view())
            .for_each(|v, &masked| {
                if masked {
                    *v = sentinel;
                }
            });
        Ok(())
    }

    /// Set every cell where `mask` is true to NaN
    pub fn mask_to_nan(&mut self, mask: &NoDataMask) -> Result<()> {
        if mask.shape() != self.shape() {
            return Err(SenorgeError::shape_mismatch(
                self.shape(),
                mask.shape(),
                "mask_to_nan",
            ));
        }
        Zip::from(&mut self.data)
            .and(mask.view())
            .for_each(|v, &masked| {
                if masked {
                    *v = f64::NAN;
                }
            });
        Ok(())
    }

    /// Replace NaN cells with the sentinel; returns the number replaced
    pub fn fill_missing(&mut self, policy: &FillValuePolicy) -> usize {
        policy.to_sentinel(&mut self.data, &self.dtype)
    }

    /// Replace sentinel cells with NaN; returns the number replaced
    pub fn restore_missing(&mut self, policy: &FillValuePolicy) -> usize {
        let sentinel = self.fill_sentinel(policy);
        policy.to_nan(&mut self.data, sentinel)
    }

    /// Reverse the row order (north-up <-> south-up)
    pub fn flipud(&self) -> Self {
        Self {
            dtype: self.dtype.clone(),
            data: self.data.slice(s![..;-1, ..]).to_owned(),
        }
    }

    /// Swap rows and columns
    pub fn transpose(&self) -> Self {
        Self {
            dtype: self.dtype.clone(),
            data: self.data.t().to_owned(),
        }
    }

    /// Quantize into `dtype`, keeping missing cells missing.
    ///
    /// NaN and the current sentinel become the sentinel of the new type;
    /// every other value is cast with truncation toward zero.
    pub fn cast(&self, dtype: DataType, policy: &FillValuePolicy) -> Self {
        let old_sentinel = self.fill_sentinel(policy);
        let new_sentinel = policy.sentinel_for(&dtype);
        let data = self.data.mapv(|v| {
            if v.is_nan() || v == old_sentinel {
                new_sentinel
            } else {
                dtype.cast(v)
            }
        });
        Self { dtype, data }
    }

    /// Convert an integer grid to float32, mapping the integer sentinel to
    /// the float32 sentinel
    pub fn to_float32(&self, policy: &FillValuePolicy) -> Self {
        self.cast(DataType::Float32, policy)
    }

    /// Count (valid, missing) cells; a cell is missing if NaN or the sentinel
    pub fn count_valid(&self, policy: &FillValuePolicy) -> (usize, usize) {
        let sentinel = self.fill_sentinel(policy);
        let missing = self
            .data
            .iter()
            .filter(|v| v.is_nan() || **v == sentinel)
            .count();
        (self.data.len() - missing, missing)
    }
}

/// Boolean raster marking cells that are permanently no-data
/// (outside Norway's land boundary).
#[derive(Debug, Clone, PartialEq)]
pub struct NoDataMask {
    mask: Array2<bool>,
}

impl NoDataMask {
    pub fn from_array(mask: Array2<bool>) -> Self {
        Self { mask }
    }

    /// Load the mask asset: a flat one-byte-per-cell BIL raster where any
    /// non-zero byte marks a no-data cell
    pub fn load(path: &Path, shape: (usize, usize)) -> Result<Self> {
        let raw = BilCodec::with_shape(shape).read(path, DataType::Int8)?;
        let mask = raw.data().mapv(|v| v != 0.0);
        debug!(
            path = %path.display(),
            masked = mask.iter().filter(|m| **m).count(),
            "Loaded no-data mask"
        );
        Ok(Self { mask })
    }

    /// Persist the mask in the same one-byte BIL layout that `load` reads
    pub fn save(&self, path: &Path) -> Result<()> {
        let raster = RasterGrid::from_array(
            self.mask.mapv(|m| if m { 1.0 } else { 0.0 }),
            DataType::Int8,
        );
        BilCodec::with_shape(self.shape()).write(&raster, path, DataType::Int8, None)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.mask.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.mask.view()
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.mask[[row, col]]
    }

    /// Reverse the row order, to match south-up NetCDF layers
    pub fn flipud(&self) -> Self {
        Self {
            mask: self.mask.slice(s![..;-1, ..]).to_owned(),
        }
    }

    /// Number of masked cells
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn test_construct_senorge() {
        let grid = RasterGrid::senorge(DataType::Uint16);
        assert_eq!(grid.shape(), (1550, 1195));
        assert_eq!(grid.height(), 1550);
        assert_eq!(grid.width(), 1195);
    }

    #[test]
    fn test_with_shape_mismatch() {
        let result = RasterGrid::with_shape(Array2::zeros((3, 4)), DataType::Int16, (4, 3));
        assert!(matches!(result, Err(SenorgeError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_apply_mask() {
        let policy = FillValuePolicy::default();
        let mut grid = RasterGrid::from_array(array![[1.0, 2.0], [3.0, 4.0]], DataType::Uint16);
        let mask = NoDataMask::from_array(array![[true, false], [false, true]]);
        grid.apply_mask(&mask, &policy).unwrap();
        assert_eq!(grid.data(), &array![[65535.0, 2.0], [3.0, 65535.0]]);

        let wrong = NoDataMask::from_array(Array2::from_elem((3, 2), false));
        assert!(matches!(
            grid.apply_mask(&wrong, &policy),
            Err(SenorgeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_flipud_and_transpose() {
        let grid = RasterGrid::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], DataType::Float32);
        assert_eq!(grid.flipud().data(), &array![[4.0, 5.0, 6.0], [1.0, 2.0, 3.0]]);
        assert_eq!(grid.transpose().shape(), (3, 2));
        assert_eq!(grid.transpose().data()[[2, 0]], 3.0);
    }

    #[test]
    fn test_cast_preserves_missing() {
        let policy = FillValuePolicy::default();
        let grid = RasterGrid::from_array(array![[1.7, 65535.0], [f64::NAN, -0.5]], DataType::Uint16);
        let float = grid.to_float32(&policy);
        assert_eq!(float.dtype(), &DataType::Float32);
        let sentinel = policy.sentinel_for(&DataType::Float32);
        assert_eq!(float.data()[[0, 1]], sentinel);
        assert_eq!(float.data()[[1, 0]], sentinel);
        assert!((float.data()[[0, 0]] - 1.7).abs() < 1e-6);

        let int = grid.cast(DataType::Int16, &policy);
        assert_eq!(int.data(), &array![[1.0, 32767.0], [32767.0, 0.0]]);
        assert_eq!(int.count_valid(&policy), (2, 2));
    }

    #[test]
    fn test_mask_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("norway_mask.bil");
        let mask = NoDataMask::from_array(array![[true, false, false], [false, false, true]]);
        mask.save(&path).unwrap();

        let loaded = NoDataMask::load(&path, (2, 3)).unwrap();
        assert_eq!(loaded, mask);
        assert_eq!(loaded.count(), 2);
        assert!(loaded.flipud().is_masked(0, 2));
    }
}
