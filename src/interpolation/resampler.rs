//! Mapping from source-axis coordinates to fractional indices.
//!
//! Two strategies share the [`GridResampler`] interface. The choice is made
//! once per axis in [`select_resampler`], so the per-point loop never
//! branches on grid regularity.

use ndarray::ArrayView1;

use super::common::is_uniform;

/// Maps a coordinate on one source axis to a fractional index.
///
/// Coordinates below the axis map to values `< 0` and coordinates above it
/// to values `> len - 1`; callers clip or mask those.
pub trait GridResampler: Send + Sync {
    /// Fractional index of `coord`
    fn fractional_index(&self, coord: f64) -> f64;

    /// Number of source coordinates
    fn len(&self) -> usize;

    /// Strategy name, for logging
    fn name(&self) -> &str;
}

/// Closed-form mapping for evenly spaced axes
#[derive(Debug, Clone, PartialEq)]
pub struct UniformGridResampler {
    start: f64,
    end: f64,
    len: usize,
}

impl UniformGridResampler {
    pub fn new(axis: ArrayView1<f64>) -> Self {
        Self {
            start: axis[0],
            end: axis[axis.len() - 1],
            len: axis.len(),
        }
    }
}

impl GridResampler for UniformGridResampler {
    fn fractional_index(&self, coord: f64) -> f64 {
        (self.len - 1) as f64 * (coord - self.start) / (self.end - self.start)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn name(&self) -> &str {
        "uniform"
    }
}

/// Binary-search mapping for unevenly spaced axes
#[derive(Debug, Clone, PartialEq)]
pub struct IrregularGridResampler {
    axis: Vec<f64>,
}

impl IrregularGridResampler {
    pub fn new(axis: ArrayView1<f64>) -> Self {
        Self {
            axis: axis.to_vec(),
        }
    }
}

impl GridResampler for IrregularGridResampler {
    /// Outside the axis the index is `-1` or `len`, inside it is the
    /// bracketing cell plus the linear offset within that cell. Both ends
    /// of the axis are included.
    fn fractional_index(&self, coord: f64) -> f64 {
        let n = self.axis.len();
        if coord < self.axis[0] {
            return -1.0;
        }
        if coord > self.axis[n - 1] {
            return n as f64;
        }
        let i = self
            .axis
            .partition_point(|&v| v < coord)
            .saturating_sub(1)
            .min(n - 2);
        i as f64 + (coord - self.axis[i]) / (self.axis[i + 1] - self.axis[i])
    }

    fn len(&self) -> usize {
        self.axis.len()
    }

    fn name(&self) -> &str {
        "irregular"
    }
}

/// Pick the resampler for an already validated (increasing, len >= 2) axis
pub fn select_resampler(axis: ArrayView1<f64>) -> Box<dyn GridResampler> {
    if is_uniform(axis) {
        Box::new(UniformGridResampler::new(axis))
    } else {
        Box::new(IrregularGridResampler::new(axis))
    }
}
