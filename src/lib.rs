//! # senorge
//!
//! Raster I/O and regridding for the seNorge 1x1 km grid over Norway.
//!
//! Daily gridded themes (snow water equivalent, temperature, precipitation
//! and friends) move between two on-disk formats:
//!
//! - **BIL**: a headerless row-major dump of one band, north-up, with an
//!   optional `.hdr` sidecar
//! - **CF NetCDF**: a CF-1.4 container on `(time, y, x)`, south-up, with
//!   UTM-33 and lon/lat coordinates
//!
//! Native model output on other rectilinear grids is brought onto the
//! seNorge mesh by the [`interpolation`] module.
//!
//! ## Architecture
//!
//! - **Grid layer**: [`grid::CoordinateGrid`] fixes the extent, cell size and
//!   projection shared by every file
//! - **Data layer**: [`raster::RasterGrid`] holds values as `f64` tagged with
//!   the [`dtype::DataType`] they are stored as; [`fill::FillValuePolicy`]
//!   maps each type to its no-data sentinel
//! - **Codecs**: [`bil::BilCodec`] and, with the `netcdf` feature,
//!   `netcdf_io::NcWriter` / `netcdf_io::NcReader`
//! - **Processing**: [`interpolation::Regridder`] with nearest, bilinear and
//!   cubic kernels

pub mod bil;
pub mod config;
pub mod dates;
pub mod dtype;
pub mod error;
pub mod fill;
pub mod grid;
pub mod interpolation;
pub mod logging;
#[cfg(feature = "netcdf")]
pub mod netcdf_io;
pub mod raster;

pub use bil::{BilCodec, BilHeader, ByteOrder};
pub use config::Config;
pub use dtype::DataType;
pub use error::{Result, SenorgeError};
pub use fill::FillValuePolicy;
pub use grid::{CoordinateGrid, UtmProjection};
pub use interpolation::{interp, regrid_to_senorge, InterpolationOrder, RegridOptions, Regridder};
pub use logging::{
    init_tracing, log_error, log_grid_stats, log_operation_end, log_operation_start,
    log_timed_operation,
};
#[cfg(feature = "netcdf")]
pub use netcdf_io::{NcReader, NcReport, NcWriter, ThemeVariable};
pub use raster::{NoDataMask, RasterGrid};
