//! Sample encodings and typed sample buffers.
//!
//! Samples are kept in their native numeric type until the value
//! normalizer runs, so integer and float math stay exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric interpretation of a TIFF sample (SampleFormat tag 339).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Unsigned,
    Signed,
    Float,
}

/// Sample encodings the pipeline can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Uint8,
    Int16,
    Uint16,
    Float32,
    Float64,
}

impl SampleFormat {
    /// Map a TIFF bit depth and sample kind to a supported format.
    ///
    /// Returns `None` for encodings the pipeline cannot render
    /// (e.g. 1-bit masks, 32-bit integers, complex samples).
    pub fn from_tiff(bits_per_sample: u16, kind: SampleKind) -> Option<Self> {
        match (bits_per_sample, kind) {
            (8, SampleKind::Unsigned) => Some(SampleFormat::Uint8),
            (16, SampleKind::Signed) => Some(SampleFormat::Int16),
            (16, SampleKind::Unsigned) => Some(SampleFormat::Uint16),
            (32, SampleKind::Float) => Some(SampleFormat::Float32),
            (64, SampleKind::Float) => Some(SampleFormat::Float64),
            _ => None,
        }
    }

    /// Parse a STAC `raster:bands` `data_type` string.
    pub fn from_data_type(data_type: &str) -> Option<Self> {
        match data_type.to_lowercase().as_str() {
            "uint8" => Some(SampleFormat::Uint8),
            "int16" => Some(SampleFormat::Int16),
            "uint16" => Some(SampleFormat::Uint16),
            "float32" => Some(SampleFormat::Float32),
            "float64" => Some(SampleFormat::Float64),
            _ => None,
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::Uint8 => 8,
            SampleFormat::Int16 | SampleFormat::Uint16 => 16,
            SampleFormat::Float32 => 32,
            SampleFormat::Float64 => 64,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, SampleFormat::Float32 | SampleFormat::Float64)
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            SampleFormat::Int16 | SampleFormat::Float32 | SampleFormat::Float64
        )
    }

    /// Natural display range for this encoding.
    ///
    /// Used as the default rescale range when the host supplies none.
    /// Float data has no natural range, so `[0, 1]` is returned.
    pub fn default_range(&self) -> (f64, f64) {
        match self {
            SampleFormat::Uint8 => (0.0, 255.0),
            SampleFormat::Int16 => (i16::MIN as f64, i16::MAX as f64),
            SampleFormat::Uint16 => (0.0, u16::MAX as f64),
            SampleFormat::Float32 | SampleFormat::Float64 => (0.0, 1.0),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::Uint8 => "uint8",
            SampleFormat::Int16 => "int16",
            SampleFormat::Uint16 => "uint16",
            SampleFormat::Float32 => "float32",
            SampleFormat::Float64 => "float64",
        };
        write!(f, "{}", name)
    }
}

/// Typed sample storage for one decoded window, pixel-interleaved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "values", rename_all = "lowercase")]
pub enum SampleBuffer {
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl SampleBuffer {
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBuffer::Uint8(_) => SampleFormat::Uint8,
            SampleBuffer::Int16(_) => SampleFormat::Int16,
            SampleBuffer::Uint16(_) => SampleFormat::Uint16,
            SampleBuffer::Float32(_) => SampleFormat::Float32,
            SampleBuffer::Float64(_) => SampleFormat::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Uint8(v) => v.len(),
            SampleBuffer::Int16(v) => v.len(),
            SampleBuffer::Uint16(v) => v.len(),
            SampleBuffer::Float32(v) => v.len(),
            SampleBuffer::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one sample widened to f64 (lossless for every supported format).
    #[inline]
    pub fn get_f64(&self, idx: usize) -> Option<f64> {
        match self {
            SampleBuffer::Uint8(v) => v.get(idx).map(|&s| s as f64),
            SampleBuffer::Int16(v) => v.get(idx).map(|&s| s as f64),
            SampleBuffer::Uint16(v) => v.get(idx).map(|&s| s as f64),
            SampleBuffer::Float32(v) => v.get(idx).map(|&s| s as f64),
            SampleBuffer::Float64(v) => v.get(idx).copied(),
        }
    }

    /// Create a zero-filled buffer of the given format.
    pub fn zeros(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::Uint8 => SampleBuffer::Uint8(vec![0; len]),
            SampleFormat::Int16 => SampleBuffer::Int16(vec![0; len]),
            SampleFormat::Uint16 => SampleBuffer::Uint16(vec![0; len]),
            SampleFormat::Float32 => SampleBuffer::Float32(vec![0.0; len]),
            SampleFormat::Float64 => SampleBuffer::Float64(vec![0.0; len]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tiff() {
        assert_eq!(SampleFormat::from_tiff(8, SampleKind::Unsigned), Some(SampleFormat::Uint8));
        assert_eq!(SampleFormat::from_tiff(16, SampleKind::Signed), Some(SampleFormat::Int16));
        assert_eq!(SampleFormat::from_tiff(32, SampleKind::Float), Some(SampleFormat::Float32));
        assert_eq!(SampleFormat::from_tiff(32, SampleKind::Unsigned), None);
        assert_eq!(SampleFormat::from_tiff(1, SampleKind::Unsigned), None);
    }

    #[test]
    fn test_from_data_type() {
        assert_eq!(SampleFormat::from_data_type("UInt16"), Some(SampleFormat::Uint16));
        assert_eq!(SampleFormat::from_data_type("float64"), Some(SampleFormat::Float64));
        assert_eq!(SampleFormat::from_data_type("cint16"), None);
    }

    #[test]
    fn test_native_values_preserved() {
        let buf = SampleBuffer::Int16(vec![-32768, 0, 32767]);
        assert_eq!(buf.get_f64(0), Some(-32768.0));
        assert_eq!(buf.get_f64(2), Some(32767.0));
        assert_eq!(buf.get_f64(3), None);
        assert_eq!(buf.format(), SampleFormat::Int16);
        assert!(SampleFormat::Int16.is_signed());
        assert!(!SampleFormat::Uint16.is_signed());
    }
}
