//! Raw sample to display intensity.

use raster_common::{RescaleRange, SampleFormat};

/// How a band decides that a raw sample carries no data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodataPolicy {
    /// Declared nodata value. NaN matches NaN.
    pub value: Option<f64>,
    /// Exact zero is nodata.
    pub zero_is_nodata: bool,
    /// Compare against the declared value at float32 precision.
    pub single_precision: bool,
}

impl NodataPolicy {
    /// Policy for a band of `format` with an optional declared nodata.
    ///
    /// The zero-as-nodata convention only applies to integer imagery
    /// that declares no nodata value of its own. Float32 bands match the
    /// declared value at the precision their samples are stored in.
    pub fn new(declared: Option<f64>, format: SampleFormat, zero_as_nodata: bool) -> Self {
        let single_precision = format == SampleFormat::Float32;
        Self {
            value: if single_precision { declared.map(|v| v as f32 as f64) } else { declared },
            zero_is_nodata: zero_as_nodata && declared.is_none() && format.is_integer(),
            single_precision,
        }
    }

    /// Only the declared value (and NaN) count as nodata.
    pub fn declared(value: Option<f64>) -> Self {
        Self {
            value,
            zero_is_nodata: false,
            single_precision: false,
        }
    }

    #[inline]
    pub fn is_nodata(&self, raw: f64) -> bool {
        if raw.is_nan() {
            return true;
        }
        if self.zero_is_nodata && raw == 0.0 {
            return true;
        }
        match self.value {
            Some(v) if self.single_precision => v as f32 == raw as f32,
            Some(v) => v == raw,
            None => false,
        }
    }
}

/// A normalized sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    /// In [0, 1]; 0 for nodata samples.
    pub intensity: f32,
    pub is_nodata: bool,
}

impl Normalized {
    pub const NODATA: Normalized = Normalized {
        intensity: 0.0,
        is_nodata: true,
    };
}

/// Linear map of `value` from `rescale` onto [0, 1], clamped.
///
/// A degenerate range (`max <= min`) yields 0 rather than NaN or infinity.
#[inline]
pub fn rescale_intensity(value: f64, rescale: &RescaleRange) -> f32 {
    if rescale.is_degenerate() || !value.is_finite() {
        return 0.0;
    }
    ((value - rescale.min) / (rescale.max - rescale.min)).clamp(0.0, 1.0) as f32
}

/// Classify and rescale one raw sample.
#[inline]
pub fn normalize(raw: f64, nodata: &NodataPolicy, rescale: &RescaleRange) -> Normalized {
    if nodata.is_nodata(raw) {
        return Normalized::NODATA;
    }
    Normalized {
        intensity: rescale_intensity(raw, rescale),
        is_nodata: false,
    }
}

/// Intensity to an 8-bit channel value.
#[inline]
pub fn to_byte(intensity: f32) -> u8 {
    (intensity.clamp(0.0, 1.0) * 255.0).round() as u8
}
