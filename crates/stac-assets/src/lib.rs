//! STAC catalog items to ordered raster assets.
//!
//! [`StacItem`] parses an item tolerantly, [`resolve_assets`] keeps the
//! tiled raster assets with their band metadata in spectral order, and
//! [`default_selection`] picks an initial band selection from them.

pub mod error;
pub mod item;
pub mod resolver;

pub use error::{Result, StacError};
pub use item::{parse_nodata, Band, EoBand, RasterBand, StacAsset, StacItem};
pub use resolver::{default_selection, is_raster_asset, raster_asset, resolve_assets};
