//! Error types for projection resolution.

use thiserror::Error;

use crate::geokeys::GeoKeyId;

/// Errors raised while resolving a raster's coordinate system.
///
/// These never escape [`crate::ProjectionResolver::resolve`]; they are
/// logged and replaced by an identity context.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// A required GeoKey is absent.
    #[error("missing geokey {0:?}")]
    MissingGeoKey(GeoKeyId),

    /// The raster uses a user-defined (32767) coordinate system.
    #[error("user-defined coordinate system is not supported")]
    UserDefinedCrs,

    /// The EPSG code is in neither the built-in registry nor the database.
    #[error("EPSG:{0} is not a known coordinate system")]
    UnknownEpsg(u32),

    /// The GeoKeyDirectory could not be parsed.
    #[error("malformed geokey directory: {0}")]
    MalformedDirectory(String),

    /// The proj4 definition was rejected.
    #[error("invalid projection definition '{definition}': {message}")]
    InvalidDefinition { definition: String, message: String },

    /// A coordinate could not be transformed.
    #[error("transform failed: {0}")]
    Transform(String),
}

impl From<ProjectionError> for raster_common::RasterError {
    fn from(err: ProjectionError) -> Self {
        raster_common::RasterError::ProjectionResolution(err.to_string())
    }
}
