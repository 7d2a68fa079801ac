//! BIL (band interleaved by line) raster codec.
//!
//! A BIL file is a flat, row-major dump of one band with no embedded shape.
//! The shape and element type are known out of band; an optional `.hdr`
//! sidecar may describe shape and byte order but is never required.

use ndarray::Array2;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::GridConfig;
use crate::dtype::DataType;
use crate::error::{Result, SenorgeError};
use crate::fill::FillValuePolicy;
use crate::raster::RasterGrid;

/// Byte order of the binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Intel, least significant byte first (`BYTEORDER I`)
    #[default]
    LittleEndian,
    /// Motorola, most significant byte first (`BYTEORDER M`)
    BigEndian,
}

impl ByteOrder {
    fn code(self) -> char {
        match self {
            ByteOrder::LittleEndian => 'I',
            ByteOrder::BigEndian => 'M',
        }
    }

    fn is_big_endian(self) -> bool {
        self == ByteOrder::BigEndian
    }
}

/// Contents of a `.hdr` sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilHeader {
    pub byte_order: ByteOrder,
    pub nrows: usize,
    pub ncols: usize,
    pub nbands: usize,
    pub nbits: usize,
}

impl BilHeader {
    /// Header describing a single-band raster of `shape` and `dtype`
    pub fn new(shape: (usize, usize), dtype: &DataType) -> Result<Self> {
        Ok(Self {
            byte_order: ByteOrder::LittleEndian,
            nrows: shape.0,
            ncols: shape.1,
            nbands: 1,
            nbits: dtype.size_of()? * 8,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Bytes per row of one band
    pub fn band_row_bytes(&self) -> usize {
        self.ncols * self.nbits / 8
    }

    /// Parse the `KEY value` lines of a sidecar. Unknown keys are ignored.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let header_error = |message: String| SenorgeError::Header {
            path: path.display().to_string(),
            message,
        };
        let parse_count = |key: &str, value: &str| {
            value
                .parse::<usize>()
                .map_err(|_| header_error(format!("{} is not a count: {}", key, value)))
        };

        let mut byte_order = ByteOrder::LittleEndian;
        let mut nrows = None;
        let mut ncols = None;
        let mut nbands = 1;
        let mut nbits = 16;

        for line in text.lines() {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            match key.to_uppercase().as_str() {
                "BYTEORDER" => {
                    byte_order = match value.to_uppercase().as_str() {
                        "I" | "LSBFIRST" => ByteOrder::LittleEndian,
                        "M" | "MSBFIRST" => ByteOrder::BigEndian,
                        other => return Err(header_error(format!("unknown byte order {}", other))),
                    }
                }
                "LAYOUT" if !value.eq_ignore_ascii_case("BIL") => {
                    return Err(header_error(format!("unsupported layout {}", value)));
                }
                "NROWS" => nrows = Some(parse_count(key, value)?),
                "NCOLS" => ncols = Some(parse_count(key, value)?),
                "NBANDS" => nbands = parse_count(key, value)?,
                "NBITS" => nbits = parse_count(key, value)?,
                _ => {}
            }
        }

        match (nrows, ncols) {
            (Some(nrows), Some(ncols)) => Ok(Self {
                byte_order,
                nrows,
                ncols,
                nbands,
                nbits,
            }),
            _ => Err(header_error("NROWS and NCOLS are required".to_string())),
        }
    }
}

impl fmt::Display for BilHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row_bytes = self.band_row_bytes();
        writeln!(f, "BYTEORDER      {}", self.byte_order.code())?;
        writeln!(f, "LAYOUT       BIL")?;
        writeln!(f, "NROWS         {}", self.nrows)?;
        writeln!(f, "NCOLS         {}", self.ncols)?;
        writeln!(f, "NBANDS        {}", self.nbands)?;
        writeln!(f, "NBITS         {}", self.nbits)?;
        writeln!(f, "BANDROWBYTES         {}", row_bytes)?;
        writeln!(f, "TOTALROWBYTES        {}", row_bytes * self.nbands)?;
        writeln!(f, "BANDGAPBYTES         0")
    }
}

/// Path of the `.hdr` sidecar belonging to a `.bil` file
pub fn header_path(path: &Path) -> PathBuf {
    path.with_extension("hdr")
}

/// Reads and writes BIL rasters of one declared shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilCodec {
    shape: (usize, usize),
    policy: FillValuePolicy,
}

impl BilCodec {
    /// Codec for the configured default shape
    pub fn new(grid: &GridConfig) -> Self {
        Self::with_shape(grid.shape())
    }

    /// Codec for an explicit shape
    pub fn with_shape(shape: (usize, usize)) -> Self {
        Self {
            shape,
            policy: FillValuePolicy::default(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Read a raster of the declared shape and `dtype`.
    ///
    /// Fails with [`SenorgeError::TruncatedFile`] when the file is too short.
    /// Trailing bytes beyond the declared shape are ignored.
    pub fn read(&self, path: &Path, dtype: DataType) -> Result<RasterGrid> {
        let size = dtype.size_of()?;
        let byte_order = self.read_header(path)?;

        let bytes = std::fs::read(path)?;
        let cells = self.shape.0 * self.shape.1;
        let expected = cells * size;
        if bytes.len() < expected {
            return Err(SenorgeError::TruncatedFile {
                path: path.display().to_string(),
                expected,
                actual: bytes.len(),
            });
        }
        if bytes.len() > expected {
            debug!(
                path = %path.display(),
                extra = bytes.len() - expected,
                "Ignoring trailing bytes"
            );
        }

        let values = bytes[..expected]
            .chunks_exact(size)
            .map(|chunk| dtype.decode(chunk, byte_order.is_big_endian()))
            .collect::<Result<Vec<f64>>>()?;
        let data = Array2::from_shape_vec(self.shape, values)?;

        info!(
            path = %path.display(),
            dtype = %dtype,
            rows = self.shape.0,
            cols = self.shape.1,
            "Read BIL raster"
        );
        Ok(RasterGrid::from_array(data, dtype))
    }

    /// Byte order from the sidecar, falling back to little-endian without one
    fn read_header(&self, path: &Path) -> Result<ByteOrder> {
        let hdr = header_path(path);
        if !hdr.exists() {
            warn!(path = %hdr.display(), "No header data found, using defaults");
            return Ok(ByteOrder::default());
        }

        let header = BilHeader::parse(&std::fs::read_to_string(&hdr)?, &hdr)?;
        if header.shape() != self.shape {
            warn!(
                path = %hdr.display(),
                header_shape = ?header.shape(),
                declared_shape = ?self.shape,
                "Header shape disagrees with declared shape, using declared shape"
            );
        }
        Ok(header.byte_order)
    }

    /// Write `grid` quantized to `dtype`, little-endian.
    ///
    /// With `lsd = Some(n)` every value is multiplied by `10^n` and then cast
    /// to `dtype`. The cast truncates toward zero without rounding, so
    /// `-1.27` with `lsd = 1` is stored as `-12`. NaN cells and cells already
    /// holding the sentinel of `dtype` are stored as that sentinel, unscaled.
    pub fn write(
        &self,
        grid: &RasterGrid,
        path: &Path,
        dtype: DataType,
        lsd: Option<i32>,
    ) -> Result<()> {
        if grid.shape() != self.shape {
            return Err(SenorgeError::shape_mismatch(
                self.shape,
                grid.shape(),
                format!("BIL write to {}", path.display()),
            ));
        }

        let sentinel = self.policy.sentinel_for(&dtype);
        let scale = lsd.map(|n| 10f64.powi(n));
        let mut bytes = Vec::with_capacity(grid.data().len() * dtype.size_of()?);
        for &value in grid.data().iter() {
            let stored = if value.is_nan() || value == sentinel {
                sentinel
            } else {
                scale.map_or(value, |s| value * s)
            };
            dtype.encode(stored, false, &mut bytes)?;
        }

        std::fs::write(path, &bytes)?;
        info!(
            path = %path.display(),
            dtype = %dtype,
            bytes = bytes.len(),
            lsd = ?lsd,
            "Wrote BIL raster"
        );
        Ok(())
    }

    /// Write the `.hdr` sidecar describing a raster of this codec's shape
    pub fn write_header(&self, path: &Path, dtype: &DataType) -> Result<PathBuf> {
        let hdr = header_path(path);
        let header = BilHeader::new(self.shape, dtype)?;
        std::fs::write(&hdr, header.to_string())?;
        debug!(path = %hdr.display(), "Wrote BIL header");
        Ok(hdr)
    }
}
