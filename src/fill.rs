//! No-data sentinels per storage type.
//!
//! Missing cells are NaN while a raster is being computed. Right before a
//! write they are replaced by the sentinel of the target type, and
//! [`FillValuePolicy::to_nan`] turns them back after a read.

use ndarray::{ArrayBase, DataMut, Dimension};

use crate::dtype::DataType;

/// No-data value for unsigned integer storage
pub const UINT_FILL_VALUE: u16 = 65535;

/// No-data value for signed 16-bit storage
pub const INT_FILL_VALUE: i16 = 32767;

/// No-data value for signed 8-bit storage.
///
/// This is the largest `i8`, not `INT_FILL_VALUE` narrowed to 8 bits:
/// narrowing 32767 wraps to `-1`, which is a valid data value.
pub const BYTE_FILL_VALUE: i8 = i8::MAX;

/// No-data value for floating point storage (the CF default `_FillValue`)
pub const FLOAT_FILL_VALUE: f64 = 9.9692e36;

/// Substituted for types without a documented sentinel
pub const DEFAULT_FILL_VALUE: f64 = -9999.0;

/// Maps element types to their sentinel and converts NaN <-> sentinel.
///
/// The policy never fails and never logs: an unsupported type gets
/// `fallback` and the caller decides whether that deserves a warning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillValuePolicy {
    /// Sentinel used for [`DataType::Unsupported`]
    pub fallback: f64,
}

impl Default for FillValuePolicy {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_FILL_VALUE,
        }
    }
}

impl FillValuePolicy {
    /// Sentinel for `dtype`, expressed exactly as the stored type would read back.
    pub fn sentinel_for(&self, dtype: &DataType) -> f64 {
        match dtype {
            DataType::Uint16 => UINT_FILL_VALUE as f64,
            DataType::Int8 => BYTE_FILL_VALUE as f64,
            DataType::Int16 => INT_FILL_VALUE as f64,
            // Rounded through f32 so it compares equal after an f32 round trip
            DataType::Float32 => FLOAT_FILL_VALUE as f32 as f64,
            DataType::Float64 => FLOAT_FILL_VALUE,
            DataType::Unsupported(_) => self.fallback,
        }
    }

    /// Whether `dtype` falls back to the default sentinel
    pub fn is_fallback(&self, dtype: &DataType) -> bool {
        matches!(dtype, DataType::Unsupported(_))
    }

    /// Replace every NaN in `data` with the sentinel of `dtype`, in place.
    ///
    /// Returns the number of replaced cells.
    pub fn to_sentinel<S, D>(&self, data: &mut ArrayBase<S, D>, dtype: &DataType) -> usize
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        let sentinel = self.sentinel_for(dtype);
        let mut replaced = 0;
        data.map_inplace(|v| {
            if v.is_nan() {
                *v = sentinel;
                replaced += 1;
            }
        });
        replaced
    }

    /// Replace every occurrence of `sentinel` in `data` with NaN, in place.
    ///
    /// Returns the number of replaced cells.
    pub fn to_nan<S, D>(&self, data: &mut ArrayBase<S, D>, sentinel: f64) -> usize
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        let mut replaced = 0;
        data.map_inplace(|v| {
            if *v == sentinel {
                *v = f64::NAN;
                replaced += 1;
            }
        });
        replaced
    }
}
