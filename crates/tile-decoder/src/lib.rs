//! Raster byte sources and tile window decoding.
//!
//! [`RasterSource`] is the boundary to whatever reads the tiled raster
//! (a COG reader, an in-memory image). [`decode`] turns one window of one
//! level into a [`raster_common::DecodedTile`] without casting samples,
//! and [`match_levels`] pairs overviews across co-registered bands.

pub mod decoder;
pub mod error;
pub mod memory;
pub mod source;

pub use decoder::{decode, level_for_dimensions, match_levels};
pub use error::{DecodeError, SourceError};
pub use memory::{MemoryLevel, MemoryRaster};
pub use source::{level_geo_transform, levels, RasterSource, SampleLayout};
