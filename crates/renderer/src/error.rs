//! Error types for normalization, compositing and encoding.

use raster_common::RasterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    /// RGB bands with unequal width/height.
    #[error("band dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("expected {expected} samples per pixel, got {actual}")]
    BandCount { expected: usize, actual: usize },

    /// Sample buffer length or format does not fit the tile.
    #[error("invalid sample layout: {0}")]
    SampleLayout(String),

    #[error("invalid colormap: {0}")]
    InvalidColormap(String),

    #[error("encoding failed: {0}")]
    Encode(String),
}

impl From<RenderError> for RasterError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::DimensionMismatch { .. } => RasterError::DimensionMismatch(err.to_string()),
            other => RasterError::Render(other.to_string()),
        }
    }
}
