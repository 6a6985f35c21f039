//! Error types for raster sources and tile decoding.

use raster_common::{RasterError, SampleKind, TileWindow};
use thiserror::Error;

/// Errors raised by a raster byte source.
///
/// Sources do not retry; whatever they report is propagated to the
/// caller unchanged.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Reading bytes failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The source does not exist or is no longer available.
    #[error("source not found: {0}")]
    NotFound(String),

    /// The source contents are not a valid raster.
    #[error("invalid raster: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

/// Errors raised while decoding one tile window.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("window {window} is outside the {width}x{height} image at level {level}")]
    TileOutOfBounds {
        window: TileWindow,
        level: usize,
        width: usize,
        height: usize,
    },

    #[error("unsupported sample format: {bits_per_sample}-bit {kind:?}")]
    UnsupportedSampleFormat { bits_per_sample: u16, kind: SampleKind },

    #[error("level {level} does not exist (raster has {count} images)")]
    InvalidLevel { level: usize, count: usize },

    /// The source returned samples that do not fit the request.
    #[error("malformed samples: {0}")]
    MalformedSamples(String),

    #[error(transparent)]
    Io(#[from] SourceError),
}

impl DecodeError {
    /// Convert into the per-tile pipeline error for `asset` at `level`.
    pub fn into_raster_error(self, asset: &str, level: usize) -> RasterError {
        RasterError::tile_decode(asset, level, self.to_string())
    }
}
