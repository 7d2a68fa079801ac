//! Error types for the senorge crate.
//!
//! Shape, truncation and I/O failures are never recovered locally; they
//! propagate to the calling theme script, which owns any retry/skip policy.

use thiserror::Error;

/// The main error type for senorge operations.
#[derive(Error, Debug)]
pub enum SenorgeError {
    /// Grid or array dimensions disagree with what an operation requires
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} ({context})")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
        context: String,
    },

    /// A binary raster file holds fewer bytes than its declared shape needs
    #[error("Truncated file {path}: expected {expected} bytes, found {actual}")]
    TruncatedFile {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// Output coordinates fall outside the source grid under strict bounds checking
    #[error("Output coordinates out of bounds: {message}")]
    OutOfBounds { message: String },

    /// Interpolation order other than 0, 1 or 3
    #[error("Invalid interpolation order {order}: must be 0 (nearest), 1 (bilinear) or 3 (cubic)")]
    InvalidOrder { order: u8 },

    /// Element type without a byte layout in the codecs
    #[error("Unsupported data type: {dtype}")]
    UnsupportedDtype { dtype: String },

    /// Source or target coordinate axes are not usable for regridding
    #[error("Invalid grid: {message}")]
    InvalidGrid { message: String },

    /// Projection setup or coordinate transformation failures
    #[error("Projection error: {message}")]
    Projection { message: String },

    /// Malformed `.hdr` sidecar
    #[error("Header error in {path}: {message}")]
    Header { path: String, message: String },

    /// The NetCDF writer was closed after an aborted write
    #[error("NetCDF file {path} is closed")]
    FileClosed { path: String },

    /// NetCDF file operation errors
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ndarray shape errors
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Failures reported by the spline collaborator
    #[error("Interpolation error: {message}")]
    Interpolation { message: String },
}

impl SenorgeError {
    /// Shorthand for a [`SenorgeError::ShapeMismatch`]
    pub fn shape_mismatch(
        expected: (usize, usize),
        actual: (usize, usize),
        context: impl Into<String>,
    ) -> Self {
        SenorgeError::ShapeMismatch {
            expected,
            actual,
            context: context.into(),
        }
    }
}

/// Convenience type alias for Results with SenorgeError
pub type Result<T> = std::result::Result<T, SenorgeError>;
