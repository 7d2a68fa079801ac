//! CF-1.4 NetCDF writer and reader for seNorge themes.
//!
//! [`NcWriter`] lays out the fixed coordinate frame (`time`, `x`, `y`,
//! `lon`, `lat` and the `UTM_Projection` grid mapping) when the file is
//! created; theme variables on `(time, y, x)` are added afterwards.
//!
//! A write aborted by a shape mismatch closes the file and leaves whatever
//! was already flushed on disk: the coordinate frame and any earlier theme
//! variables. Callers that need all-or-nothing output must remove the file
//! themselves.

use chrono::Utc;
use ndarray::{Array2, ArrayView2};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dates::{from_epoch_seconds, TIME_UNITS};
use crate::dtype::DataType;
use crate::error::{Result, SenorgeError};
use crate::fill::FillValuePolicy;
use crate::grid::CoordinateGrid;
use crate::raster::RasterGrid;

/// Name of the scalar grid-mapping variable
pub const PROJECTION_VARIABLE: &str = "UTM_Projection";

/// Description of a theme variable on `(time, y, x)`
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeVariable {
    pub name: String,
    pub dtype: DataType,
    pub units: String,
    pub long_name: String,
    /// Decimal digits kept by the netCDF4 quantization; `None` stores as-is
    pub lsd: Option<i32>,
}

impl ThemeVariable {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            units: String::new(),
            long_name: String::new(),
            lsd: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    pub fn with_lsd(mut self, lsd: i32) -> Self {
        self.lsd = Some(lsd);
        self
    }
}

/// netCDF4 `least_significant_digit` quantization: `round(x * 2^b) / 2^b`
/// with `b = ceil(log2(10^lsd))`
pub fn quantize(value: f64, lsd: i32) -> f64 {
    let bits = (10f64.powi(lsd)).log2().ceil();
    let scale = 2f64.powf(bits);
    (value * scale).round() / scale
}

// Adds a typed theme variable and writes every prepared layer.
macro_rules! write_theme {
    ($file:expr, $theme:expr, $ty:ty, $layers:expr, $sentinel:expr, $deflate:expr) => {{
        let mut var = $file.add_variable::<$ty>(&$theme.name, &["time", "y", "x"])?;
        if let Some(level) = $deflate {
            var.set_compression(level, true)?;
        }
        var.put_attribute("_FillValue", $sentinel as $ty)?;
        var.put_attribute("units", $theme.units.as_str())?;
        var.put_attribute("long_name", $theme.long_name.as_str())?;
        var.put_attribute("_CoordinateSystems", PROJECTION_VARIABLE)?;
        if let Some(lsd) = $theme.lsd {
            var.put_attribute("least_significant_digit", lsd)?;
        }
        for (t, layer) in $layers.iter().enumerate() {
            let vals: Vec<$ty> = layer.iter().map(|&v| v as $ty).collect();
            var.put_values(&vals, (t, .., ..))?;
        }
    }};
}

/// Writer for a seNorge CF NetCDF file
pub struct NcWriter {
    path: PathBuf,
    file: Option<netcdf::FileMut>,
    grid: CoordinateGrid,
    ntimes: usize,
    deflate_level: Option<i32>,
    policy: FillValuePolicy,
}

impl NcWriter {
    /// Create a file on the national seNorge grid with one `time` entry
    /// per element of `times` (seconds since 1970-01-01T00:00:00Z).
    pub fn create(path: &Path, config: &Config, times: &[f64]) -> Result<Self> {
        Self::create_with_grid(path, config, CoordinateGrid::senorge(), times)
    }

    /// Create a file on an arbitrary regular UTM grid
    pub fn create_with_grid(
        path: &Path,
        config: &Config,
        grid: CoordinateGrid,
        times: &[f64],
    ) -> Result<Self> {
        if times.is_empty() {
            return Err(SenorgeError::InvalidParameter {
                param: "times".to_string(),
                message: "a NetCDF file needs at least one time step".to_string(),
            });
        }

        let (height, width) = grid.shape();
        let deflate_level = config.netcdf.compress.then_some(config.netcdf.deflate_level);
        let mut file = netcdf::create(path)?;

        file.add_dimension("time", times.len())?;
        file.add_dimension("x", width)?;
        file.add_dimension("y", height)?;

        file.add_attribute("Conventions", "CF-1.4")?;
        file.add_attribute("institution", config.netcdf.institution.as_str())?;
        file.add_attribute("source", config.netcdf.source.as_str())?;
        let history = format!("{} created", Utc::now().format("%a %b %e %H:%M:%S %Y"));
        file.add_attribute("history", history.as_str())?;
        file.add_attribute("references", config.netcdf.references.as_str())?;
        file.add_attribute("comment", config.netcdf.comment.as_str())?;

        {
            let mut time = file.add_variable::<f64>("time", &["time"])?;
            time.put_attribute("units", TIME_UNITS)?;
            time.put_attribute("long_name", "time")?;
            time.put_attribute("standard_name", "time")?;
            time.put_attribute("axis", "T")?;
            time.put_attribute("calendar", "standard")?;
            time.put_values(times, ..)?;
        }

        write_projection(&mut file, &grid)?;
        write_axes(&mut file, &grid, deflate_level)?;
        write_lonlat(&mut file, &grid, deflate_level)?;

        info!(
            path = %path.display(),
            ntimes = times.len(),
            rows = height,
            cols = width,
            "Created NetCDF file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            grid,
            ntimes: times.len(),
            deflate_level,
            policy: FillValuePolicy::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    /// False once the file was closed, explicitly or by an aborted write
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Add a single-layer theme variable
    pub fn add_variable(&mut self, theme: &ThemeVariable, data: ArrayView2<f64>) -> Result<()> {
        self.add_time_series(theme, &[data])
    }

    /// Add a theme variable with one layer per `time` entry.
    ///
    /// Layers shaped `(width, height)` are transposed. Any other shape
    /// closes the file and returns [`SenorgeError::ShapeMismatch`].
    pub fn add_time_series(&mut self, theme: &ThemeVariable, layers: &[ArrayView2<f64>]) -> Result<()> {
        if self.file.is_none() {
            return Err(SenorgeError::FileClosed {
                path: self.path.display().to_string(),
            });
        }
        if layers.len() != self.ntimes {
            return Err(SenorgeError::InvalidParameter {
                param: "layers".to_string(),
                message: format!(
                    "{} layers given for {} time steps of {}",
                    layers.len(),
                    self.ntimes,
                    theme.name
                ),
            });
        }
        if let DataType::Unsupported(code) = &theme.dtype {
            return Err(SenorgeError::UnsupportedDtype { dtype: code.clone() });
        }

        let expected = self.grid.shape();
        let mut oriented = Vec::with_capacity(layers.len());
        for layer in layers {
            if layer.dim() == expected {
                oriented.push(*layer);
            } else if layer.dim() == (expected.1, expected.0) {
                warn!(variable = %theme.name, "Data array transposed before saving");
                oriented.push(layer.t());
            } else {
                self.file.take();
                warn!(
                    path = %self.path.display(),
                    variable = %theme.name,
                    "Closed NetCDF file after shape mismatch"
                );
                return Err(SenorgeError::shape_mismatch(
                    expected,
                    layer.dim(),
                    format!("NetCDF variable {}", theme.name),
                ));
            }
        }

        let sentinel = self.policy.sentinel_for(&theme.dtype);
        let prepared: Vec<Array2<f64>> = oriented
            .iter()
            .map(|layer| {
                layer.mapv(|v| match (v.is_nan(), theme.lsd) {
                    (true, _) => sentinel,
                    (false, Some(lsd)) if v != sentinel => quantize(v, lsd),
                    _ => v,
                })
            })
            .collect();

        let deflate = self.deflate_level;
        let file = self.file.as_mut().ok_or_else(|| SenorgeError::FileClosed {
            path: self.path.display().to_string(),
        })?;

        match theme.dtype {
            DataType::Uint16 => write_theme!(file, theme, u16, prepared, sentinel, deflate),
            DataType::Int8 => write_theme!(file, theme, i8, prepared, sentinel, deflate),
            DataType::Int16 => write_theme!(file, theme, i16, prepared, sentinel, deflate),
            DataType::Float32 => write_theme!(file, theme, f32, prepared, sentinel, deflate),
            DataType::Float64 => write_theme!(file, theme, f64, prepared, sentinel, deflate),
            DataType::Unsupported(ref code) => {
                return Err(SenorgeError::UnsupportedDtype { dtype: code.clone() })
            }
        }

        info!(
            variable = %theme.name,
            path = %self.path.display(),
            dtype = %theme.dtype,
            "Added variable"
        );
        Ok(())
    }

    /// Flush and close the file
    pub fn close(mut self) -> Result<()> {
        match self.file.take() {
            Some(file) => {
                drop(file);
                debug!(path = %self.path.display(), "Closed NetCDF file");
                Ok(())
            }
            None => Err(SenorgeError::FileClosed {
                path: self.path.display().to_string(),
            }),
        }
    }
}

fn write_projection(file: &mut netcdf::FileMut, grid: &CoordinateGrid) -> Result<()> {
    let p = &grid.projection;
    let mut utm = file.add_variable::<i32>(PROJECTION_VARIABLE, &[])?;
    utm.put_attribute("units", "meters")?;
    utm.put_attribute(
        "long_name",
        format!("Universal Transverse Mercator Projection, Zone {}", p.zone).as_str(),
    )?;
    utm.put_attribute("grid_mapping_name", "UTM")?;
    utm.put_attribute("scale_factor_at_central_meridian", p.scale_factor)?;
    utm.put_attribute("latitude_of_projection_origin", p.latitude_of_origin)?;
    utm.put_attribute("false_easting", p.false_easting)?;
    utm.put_attribute("utm_zone_number", p.zone as i32)?;
    utm.put_attribute("longitude_of_central_meridian", p.central_meridian)?;
    utm.put_attribute("semimajor_axis", p.semi_major_axis)?;
    utm.put_attribute("semi_minor_axis", p.semi_minor_axis)?;
    utm.put_attribute("proj4", p.proj4().as_str())?;
    utm.put_attribute("_CoordinateTransformType", "Projection")?;
    utm.put_attribute("_CoordinateAxes", "y x")?;
    utm.put_attribute("_CoordinateAxisTypes", "GeoX GeoY")?;
    Ok(())
}

fn write_axes(
    file: &mut netcdf::FileMut,
    grid: &CoordinateGrid,
    deflate_level: Option<i32>,
) -> Result<()> {
    let (x, y) = grid.target_axes();
    for (name, values, label) in [("x", x, "GeoX"), ("y", y, "GeoY")] {
        let mut var = file.add_variable::<f32>(name, &[name])?;
        if let Some(level) = deflate_level {
            var.set_compression(level, true)?;
        }
        var.put_attribute("axis", name.to_uppercase().as_str())?;
        var.put_attribute("units", "m")?;
        var.put_attribute(
            "long_name",
            format!("{} coordinate of projection", name).as_str(),
        )?;
        var.put_attribute(
            "standard_name",
            format!("projection_{}_coordinate", name).as_str(),
        )?;
        var.put_attribute("_CoordinateAxisType", label)?;
        let vals: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        var.put_values(&vals, ..)?;
    }
    Ok(())
}

fn write_lonlat(
    file: &mut netcdf::FileMut,
    grid: &CoordinateGrid,
    deflate_level: Option<i32>,
) -> Result<()> {
    let (xgrid, ygrid) = grid.target_mesh();
    let (lon, lat) = grid.to_lonlat(xgrid.view(), ygrid.view())?;
    let fields = [
        ("lon", lon, "degrees_east", "longitude"),
        ("lat", lat, "degrees_north", "latitude"),
    ];
    for (name, values, units, long_name) in fields {
        let mut var = file.add_variable::<f32>(name, &["y", "x"])?;
        if let Some(level) = deflate_level {
            var.set_compression(level, true)?;
        }
        var.put_attribute("units", units)?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("standard_name", long_name)?;
        let vals: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        var.put_values(&vals, (.., ..))?;
    }
    Ok(())
}

/// Read access to a NetCDF theme file
pub struct NcReader {
    path: PathBuf,
    file: netcdf::File,
}

impl NcReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = netcdf::open(path)?;
        debug!(path = %path.display(), "Opened NetCDF file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    pub fn dimensions(&self) -> Vec<(String, usize)> {
        self.file
            .dimensions()
            .map(|d| (d.name(), d.len()))
            .collect()
    }

    /// Values of the `time` coordinate; empty when the file has none
    pub fn times(&self) -> Result<Vec<f64>> {
        match self.file.variable("time") {
            Some(var) => Ok(var.get_values::<f64, _>(..)?),
            None => Ok(Vec::new()),
        }
    }

    /// A global text attribute, if present
    pub fn global_attribute(&self, name: &str) -> Option<String> {
        match self.file.attribute(name)?.value() {
            Ok(AttributeValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// An attribute of `variable`, if present
    pub fn variable_attribute(&self, variable: &str, name: &str) -> Option<AttributeValue> {
        self.file.variable(variable)?.attribute(name)?.value().ok()
    }

    /// Layer `t` of a `(time, y, x)` variable, or the whole of a `(y, x)` one,
    /// tagged with the stored element type. Fill values are kept as stored.
    pub fn read_variable(&self, name: &str, t: usize) -> Result<RasterGrid> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| SenorgeError::InvalidParameter {
                param: "variable".to_string(),
                message: format!("{} not found in {}", name, self.path.display()),
            })?;

        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let (values, shape) = match dims.as_slice() {
            [nt, ny, nx] => {
                if t >= *nt {
                    return Err(SenorgeError::OutOfBounds {
                        message: format!("time index {} of {} steps in {}", t, nt, name),
                    });
                }
                (var.get_values::<f64, _>((t, .., ..))?, (*ny, *nx))
            }
            [ny, nx] => (var.get_values::<f64, _>((.., ..))?, (*ny, *nx)),
            _ => {
                return Err(SenorgeError::InvalidParameter {
                    param: "variable".to_string(),
                    message: format!("{} is not a 2-D or (time, y, x) field", name),
                })
            }
        };

        let dtype = stored_dtype(&var);
        let data = Array2::from_shape_vec(shape, values)?;
        debug!(variable = name, t, dtype = %dtype, "Read NetCDF layer");
        Ok(RasterGrid::from_array(data, dtype))
    }

    /// Summary of dimensions, variables and the time axis
    pub fn report(&self) -> Result<NcReport> {
        Ok(NcReport {
            path: self.path.clone(),
            conventions: self.global_attribute("Conventions"),
            dimensions: self.dimensions(),
            variables: self.variable_names(),
            times: self.times()?,
        })
    }
}

/// Element type of a stored variable, from its `_FillValue` or else its
/// declared type
fn stored_dtype(var: &netcdf::Variable) -> DataType {
    let from_fill = var
        .attribute("_FillValue")
        .and_then(|a| a.value().ok())
        .and_then(|v| match v {
            AttributeValue::Ushort(_) => Some(DataType::Uint16),
            AttributeValue::Short(_) => Some(DataType::Int16),
            AttributeValue::Schar(_) => Some(DataType::Int8),
            AttributeValue::Float(_) => Some(DataType::Float32),
            AttributeValue::Double(_) => Some(DataType::Float64),
            _ => None,
        });
    if let Some(dtype) = from_fill {
        return dtype;
    }

    match var.vartype() {
        NcVariableType::Int(IntType::U16) => DataType::Uint16,
        NcVariableType::Int(IntType::I16) => DataType::Int16,
        NcVariableType::Int(IntType::I8) => DataType::Int8,
        NcVariableType::Float(FloatType::F32) => DataType::Float32,
        NcVariableType::Float(FloatType::F64) => DataType::Float64,
        other => DataType::Unsupported(format!("{:?}", other)),
    }
}

/// What `inspect_netcdf` prints
#[derive(Debug, Clone, PartialEq)]
pub struct NcReport {
    pub path: PathBuf,
    pub conventions: Option<String>,
    pub dimensions: Vec<(String, usize)>,
    pub variables: Vec<String>,
    pub times: Vec<f64>,
}

impl NcReport {
    /// Spacing of the first two time steps in hours
    pub fn time_step_hours(&self) -> Option<f64> {
        match self.times.as_slice() {
            [first, second, ..] => Some((second - first) / 3600.0),
            _ => None,
        }
    }
}

impl fmt::Display for NcReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = |secs: f64| {
            from_epoch_seconds(secs)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| format!("{} s", secs))
        };

        writeln!(f, "File: {}", self.path.display())?;
        if let Some(conventions) = &self.conventions {
            writeln!(f, "\tConventions: {}", conventions)?;
        }
        match (self.times.first(), self.times.last(), self.time_step_hours()) {
            (Some(&first), Some(&last), Some(step)) => {
                writeln!(f, "\tTime-range: {} - {}", stamp(first), stamp(last))?;
                writeln!(f, "\tTime-step: {:.2} h", step)?;
            }
            (Some(&first), _, None) => writeln!(f, "\tTime: {}", stamp(first))?,
            _ => {}
        }
        writeln!(f, "\tDimensions:")?;
        for (name, len) in &self.dimensions {
            writeln!(f, "\t\t{} ({})", name, len)?;
        }
        writeln!(f, "\tVariables:")?;
        for name in &self.variables {
            writeln!(f, "\t\t{}", name)?;
        }
        Ok(())
    }
}
