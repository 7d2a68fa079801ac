//! Common utilities for interpolation algorithms.

use ndarray::ArrayView1;

use crate::error::{Result, SenorgeError};

/// Spread of cell widths below which an axis counts as uniformly spaced
pub const UNIFORM_TOLERANCE: f64 = 1e-4;

/// Clamp a fractional index to `[0, size - 1]`
pub fn clamp_index(index: f64, size: usize) -> f64 {
    index.max(0.0).min((size - 1) as f64)
}

/// Get the weight for linear interpolation
pub fn linear_weight(fraction: f64) -> (f64, f64) {
    (1.0 - fraction, fraction)
}

/// Whether a fractional index lies outside `[0, size - 1]`
pub fn is_outside(index: f64, size: usize) -> bool {
    index < 0.0 || index > (size - 1) as f64
}

/// Whether all cell widths of `axis` agree within [`UNIFORM_TOLERANCE`]
pub fn is_uniform(axis: ArrayView1<f64>) -> bool {
    let (min, max) = axis
        .windows(2)
        .into_iter()
        .map(|w| w[1] - w[0])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
    max - min < UNIFORM_TOLERANCE
}

/// Require at least two strictly increasing coordinates
pub fn validate_axis(name: &str, axis: ArrayView1<f64>) -> Result<()> {
    if axis.len() < 2 {
        return Err(SenorgeError::InvalidGrid {
            message: format!("{} needs at least 2 coordinates, got {}", name, axis.len()),
        });
    }
    if let Some(i) = axis
        .windows(2)
        .into_iter()
        .position(|w| !(w[1] > w[0]))
    {
        return Err(SenorgeError::InvalidGrid {
            message: format!(
                "{} must be strictly increasing (index {}: {} -> {})",
                name,
                i,
                axis[i],
                axis[i + 1]
            ),
        });
    }
    Ok(())
}
