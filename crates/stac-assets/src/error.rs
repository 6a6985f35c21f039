//! Error types for catalog parsing and asset resolution.

use raster_common::RasterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StacError>;

#[derive(Error, Debug)]
pub enum StacError {
    #[error("Invalid item JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read item: {0}")]
    Io(#[from] std::io::Error),

    /// The item has no `assets` object.
    #[error("Item '{0}' has no assets map")]
    MissingAssets(String),

    /// None of the item's assets is a tiled raster.
    #[error("Item '{0}' has no raster assets")]
    NoRasterAssets(String),
}

impl From<StacError> for RasterError {
    fn from(err: StacError) -> Self {
        RasterError::asset_resolution(err.to_string())
    }
}
