//! Configuration management for senorge.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`SENORGE_*`)
//! 3. JSON config file
//! 4. Default values (lowest priority)
//!
//! The resulting [`Config`] is passed explicitly into the codecs; nothing in
//! the crate reads paths from process-wide globals.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SenorgeError};
use crate::grid::{SENORGE_HEIGHT, SENORGE_WIDTH};

/// Command-line arguments for the BIL to NetCDF converter
#[derive(Parser, Debug, Clone)]
#[command(name = "senorge")]
#[command(author, version, about = "Convert seNorge BIL theme files to CF NetCDF", long_about = None)]
pub struct Args {
    /// BIL theme file, named `<theme>_YYYY_MM_DD.bil`
    pub bil_file: PathBuf,

    /// Element type stored in the BIL file (uint16, int16, int8, float32, float64)
    #[arg(short, long, env = "SENORGE_DTYPE", default_value = "uint16")]
    pub dtype: String,

    /// Name of the theme variable in the NetCDF file (defaults to the theme prefix of the file name)
    #[arg(long, env = "SENORGE_VAR_NAME")]
    pub var_name: Option<String>,

    /// Units of the theme variable
    #[arg(short, long, env = "SENORGE_UNITS", default_value = "")]
    pub units: String,

    /// Long name of the theme variable
    #[arg(long, env = "SENORGE_LONG_NAME", default_value = "")]
    pub long_name: String,

    /// Directory for the NetCDF output
    #[arg(short, long, env = "SENORGE_NETCDF_OUT")]
    pub output_dir: Option<PathBuf>,

    /// Norway no-data mask asset
    #[arg(short, long, env = "SENORGE_MASK_FILE")]
    pub mask: Option<PathBuf>,

    /// Enable zlib compression of theme variables
    #[arg(long, env = "SENORGE_COMPRESS")]
    pub compress: bool,

    /// Path to JSON configuration file
    #[arg(short, long, env = "SENORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SENORGE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Folder searched for BIL files not found as given
    #[serde(default = "default_bil_dir")]
    pub bil_in: PathBuf,

    /// Folder receiving output NetCDF files
    #[serde(default = "default_netcdf_dir")]
    pub netcdf_out: PathBuf,

    /// Norway no-data mask asset (one byte per cell, non-zero = no data)
    #[serde(default)]
    pub mask_file: Option<PathBuf>,
}

/// Default BIL raster shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_nrows")]
    pub nrows: usize,

    #[serde(default = "default_ncols")]
    pub ncols: usize,
}

impl GridConfig {
    /// Shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }
}

/// NetCDF writer settings and global attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetcdfConfig {
    /// zlib-compress theme variables
    #[serde(default)]
    pub compress: bool,

    /// Deflate level used when `compress` is set (0-9)
    #[serde(default = "default_deflate_level")]
    pub deflate_level: i32,

    #[serde(default = "default_institution")]
    pub institution: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub references: String,

    #[serde(default = "default_comment")]
    pub comment: String,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub netcdf: NetcdfConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Parse the command line and load configuration from all sources
    pub fn load() -> Result<(Self, Args)> {
        let args = Args::parse();
        let config = Self::from_args(&args)?;
        Ok((config, args))
    }

    /// Build the configuration for already parsed arguments.
    ///
    /// clap has folded `SENORGE_*` variables into `args`, so applying the
    /// arguments over the JSON file yields the documented precedence.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(dir) = &args.output_dir {
            config.paths.netcdf_out = dir.clone();
        }
        if args.mask.is_some() {
            config.paths.mask_file = args.mask.clone();
        }
        if args.compress {
            config.netcdf.compress = true;
        }
        if let Some(level) = &args.log_level {
            config.log_level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Locate an input BIL file: as given when it exists there, otherwise
    /// relative to `paths.bil_in`
    pub fn resolve_bil_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() || file.exists() {
            file.to_path_buf()
        } else {
            self.paths.bil_in.join(file)
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.grid.nrows == 0 || self.grid.ncols == 0 {
            return Err(SenorgeError::Config {
                message: format!(
                    "Grid shape must be non-empty, got {}x{}",
                    self.grid.nrows, self.grid.ncols
                ),
            });
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(SenorgeError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        if !(0..=9).contains(&self.netcdf.deflate_level) {
            return Err(SenorgeError::Config {
                message: format!(
                    "Invalid deflate level: {}. Must be between 0 and 9",
                    self.netcdf.deflate_level
                ),
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            grid: GridConfig::default(),
            netcdf: NetcdfConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            bil_in: default_bil_dir(),
            netcdf_out: default_netcdf_dir(),
            mask_file: None,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            nrows: default_nrows(),
            ncols: default_ncols(),
        }
    }
}

impl Default for NetcdfConfig {
    fn default() -> Self {
        Self {
            compress: false,
            deflate_level: default_deflate_level(),
            institution: default_institution(),
            source: String::new(),
            references: String::new(),
            comment: default_comment(),
        }
    }
}

// Default value functions for serde
fn default_bil_dir() -> PathBuf {
    PathBuf::from("snowsim")
}

fn default_netcdf_dir() -> PathBuf {
    PathBuf::from("netcdf")
}

fn default_nrows() -> usize {
    SENORGE_HEIGHT
}

fn default_ncols() -> usize {
    SENORGE_WIDTH
}

fn default_deflate_level() -> i32 {
    4
}

fn default_institution() -> String {
    "Norwegian Water Resources and Energy Directorate (NVE)".to_string()
}

fn default_comment() -> String {
    "Data distributed via www.senorge.no".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
