//! Storage element types supported by the seNorge codecs.
//!
//! In memory every raster is held as `f64`; a [`DataType`] tag records the
//! type the values are quantized to when they reach disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SenorgeError};

/// Closed set of on-disk element types.
///
/// `Unsupported` keeps the original type code so that callers can log it;
/// the fill policy still answers for it, but the codecs refuse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Uint16,
    Int8,
    Int16,
    Float32,
    Float64,
    Unsupported(String),
}

impl DataType {
    /// Parse a numpy-style type code (`uint16`, `u2`, `<u2`, `i1`, `f4`, ...).
    ///
    /// Unknown codes map to [`DataType::Unsupported`] instead of failing.
    pub fn parse(code: &str) -> Self {
        let trimmed = code.trim().trim_start_matches(['<', '>', '=', '|']);
        match trimmed.to_lowercase().as_str() {
            "uint16" | "u2" | "ushort" => DataType::Uint16,
            "int8" | "i1" | "byte" => DataType::Int8,
            "int16" | "i2" | "short" => DataType::Int16,
            "float32" | "f4" | "float" => DataType::Float32,
            "float64" | "f8" | "double" => DataType::Float64,
            _ => DataType::Unsupported(code.to_string()),
        }
    }

    /// Number of bytes per element, if the type has a binary layout
    pub fn size_of(&self) -> Result<usize> {
        match self {
            DataType::Int8 => Ok(1),
            DataType::Uint16 | DataType::Int16 => Ok(2),
            DataType::Float32 => Ok(4),
            DataType::Float64 => Ok(8),
            DataType::Unsupported(code) => Err(SenorgeError::UnsupportedDtype {
                dtype: code.clone(),
            }),
        }
    }

    /// Whether values of this type carry a fractional part
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Short numpy code, as used in `.hdr` sidecars and log output
    pub fn code(&self) -> &str {
        match self {
            DataType::Uint16 => "u2",
            DataType::Int8 => "i1",
            DataType::Int16 => "i2",
            DataType::Float32 => "f4",
            DataType::Float64 => "f8",
            DataType::Unsupported(code) => code,
        }
    }

    /// Cast an `f64` into this type and back.
    ///
    /// Integer targets truncate toward zero and saturate at the type range
    /// (NaN becomes 0), which is Rust's `as` semantics. Callers must replace
    /// NaN with a sentinel first if missing cells are to survive.
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            DataType::Uint16 => value as u16 as f64,
            DataType::Int8 => value as i8 as f64,
            DataType::Int16 => value as i16 as f64,
            DataType::Float32 => value as f32 as f64,
            DataType::Float64 | DataType::Unsupported(_) => value,
        }
    }

    /// Encode one value in the requested byte order, appending to `out`
    pub(crate) fn encode(&self, value: f64, big_endian: bool, out: &mut Vec<u8>) -> Result<()> {
        macro_rules! push {
            ($v:expr) => {
                if big_endian {
                    out.extend_from_slice(&$v.to_be_bytes())
                } else {
                    out.extend_from_slice(&$v.to_le_bytes())
                }
            };
        }
        match self {
            DataType::Uint16 => push!(value as u16),
            DataType::Int8 => push!(value as i8),
            DataType::Int16 => push!(value as i16),
            DataType::Float32 => push!(value as f32),
            DataType::Float64 => push!(value),
            DataType::Unsupported(code) => {
                return Err(SenorgeError::UnsupportedDtype {
                    dtype: code.clone(),
                })
            }
        }
        Ok(())
    }

    /// Decode one element from exactly `size_of()` bytes
    pub(crate) fn decode(&self, bytes: &[u8], big_endian: bool) -> Result<f64> {
        macro_rules! pull {
            ($t:ty, $n:expr) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&bytes[..$n]);
                if big_endian {
                    <$t>::from_be_bytes(buf) as f64
                } else {
                    <$t>::from_le_bytes(buf) as f64
                }
            }};
        }
        let value = match self {
            DataType::Uint16 => pull!(u16, 2),
            DataType::Int8 => pull!(i8, 1),
            DataType::Int16 => pull!(i16, 2),
            DataType::Float32 => pull!(f32, 4),
            DataType::Float64 => pull!(f64, 8),
            DataType::Unsupported(code) => {
                return Err(SenorgeError::UnsupportedDtype {
                    dtype: code.clone(),
                })
            }
        };
        Ok(value)
    }
}

impl FromStr for DataType {
    type Err = SenorgeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(DataType::parse(s))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Uint16 => "uint16",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Unsupported(code) => return write!(f, "unsupported({})", code),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(DataType::parse("uint16"), DataType::Uint16);
        assert_eq!(DataType::parse("<u2"), DataType::Uint16);
        assert_eq!(DataType::parse("i1"), DataType::Int8);
        assert_eq!(DataType::parse("int16"), DataType::Int16);
        assert_eq!(DataType::parse("f4"), DataType::Float32);
        assert_eq!(DataType::parse("Float64"), DataType::Float64);
        assert_eq!(
            DataType::parse("complex128"),
            DataType::Unsupported("complex128".to_string())
        );
    }

    #[test]
    fn test_size_of() {
        assert_eq!(DataType::Int8.size_of().unwrap(), 1);
        assert_eq!(DataType::Uint16.size_of().unwrap(), 2);
        assert_eq!(DataType::Float64.size_of().unwrap(), 8);
        assert!(matches!(
            DataType::parse("u8").size_of(),
            Err(SenorgeError::UnsupportedDtype { .. })
        ));
    }

    #[test]
    fn test_cast_truncates_toward_zero() {
        assert_eq!(DataType::Int16.cast(12.9), 12.0);
        assert_eq!(DataType::Int16.cast(-12.9), -12.0);
        assert_eq!(DataType::Uint16.cast(-3.0), 0.0);
        assert_eq!(DataType::Int8.cast(300.0), 127.0);
        assert_eq!(DataType::Float64.cast(0.1), 0.1);
    }

    #[test]
    fn test_encode_decode_byte_order() {
        let mut le = Vec::new();
        DataType::Int16.encode(-2.0, false, &mut le).unwrap();
        assert_eq!(le, vec![0xFE, 0xFF]);

        let mut be = Vec::new();
        DataType::Int16.encode(-2.0, true, &mut be).unwrap();
        assert_eq!(be, vec![0xFF, 0xFE]);
        assert_eq!(DataType::Int16.decode(&be, true).unwrap(), -2.0);
    }
}
