//! Coordinate reference system resolution for geo-referenced rasters.
//!
//! Converts the GeoKeyDirectory embedded in a GeoTIFF into a forward /
//! inverse transform between the raster's model coordinates and
//! geographic longitude/latitude. Resolution never fails the tile
//! pipeline: anything unresolvable degrades to an identity transform.

pub mod error;
pub mod geokeys;
pub mod registry;
pub mod resolver;

pub use error::ProjectionError;
pub use geokeys::{GeoKeyId, GeoKeys, ModelType, USER_DEFINED};
pub use registry::{is_geographic, DefinitionSource, ProjectionRegistry, WGS84_LONGLAT};
pub use resolver::{ProjectionContext, ProjectionResolver};
