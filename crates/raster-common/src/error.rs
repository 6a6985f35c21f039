//! Error types for the raster tile pipeline.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type surfaced to the host of a raster layer.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Setup Errors ===
    #[error("Asset resolution failed: {0}")]
    AssetResolution(String),

    #[error("Projection resolution failed: {0}")]
    ProjectionResolution(String),

    #[error("Invalid layer configuration: {0}")]
    InvalidConfig(String),

    // === Per-tile Errors ===
    #[error("Tile decode failed for {asset} at level {level}: {message}")]
    TileDecode {
        asset: String,
        level: usize,
        message: String,
    },

    #[error("Band dimensions differ: {0}")]
    DimensionMismatch(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl RasterError {
    /// Create an AssetResolution error.
    pub fn asset_resolution(msg: impl Into<String>) -> Self {
        Self::AssetResolution(msg.into())
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a TileDecode error.
    pub fn tile_decode(asset: impl Into<String>, level: usize, msg: impl Into<String>) -> Self {
        Self::TileDecode {
            asset: asset.into(),
            level,
            message: msg.into(),
        }
    }

    /// Whether this error halts activation of the layer that raised it.
    ///
    /// Setup-time failures are reported once and the layer is not added.
    /// Per-tile failures are reported per tile and later tiles are still
    /// requested.
    pub fn is_fatal_for_layer(&self) -> bool {
        match self {
            RasterError::AssetResolution(_) | RasterError::InvalidConfig(_) => true,
            // Degrades to an identity transform, never halts the layer.
            RasterError::ProjectionResolution(_) => false,
            RasterError::TileDecode { .. }
            | RasterError::DimensionMismatch(_)
            | RasterError::Render(_) => false,
        }
    }

    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            RasterError::AssetResolution(_) => "asset_resolution",
            RasterError::ProjectionResolution(_) => "projection_resolution",
            RasterError::InvalidConfig(_) => "invalid_config",
            RasterError::TileDecode { .. } => "tile_decode",
            RasterError::DimensionMismatch(_) => "dimension_mismatch",
            RasterError::Render(_) => "render",
        }
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::InvalidConfig(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for RasterError {
    fn from(err: serde_yaml::Error) -> Self {
        RasterError::InvalidConfig(format!("YAML error: {}", err))
    }
}
