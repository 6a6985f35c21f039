//! Common types and utilities shared across the raster tile pipeline crates.

pub mod band;
pub mod color;
pub mod config;
pub mod error;
pub mod sample;
pub mod tile;

pub use band::{BandSelection, ColormapChoice, RasterAsset, RescaleRange};
pub use color::{ColorStop, Rgb};
pub use config::{LayerConfig, PipelineSettings};
pub use error::{RasterError, RasterResult};
pub use sample::{SampleBuffer, SampleFormat, SampleKind};
pub use tile::{DecodedTile, GeoTransform, LonLatBounds, RenderedTile, TileWindow};
