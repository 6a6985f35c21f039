//! Raster tile rendering: sample normalization, colormaps and band compositing.
//!
//! - [`normalize`]: raw sample to [0, 1] intensity with nodata detection
//! - [`colormap`] / [`ramps`]: color ramps, interpolation and lookup textures
//! - [`composite`]: single-band, RGB and native-RGB tiles to RGBA
//! - [`png`]: PNG export of rendered tiles and colormap swatches

pub mod colormap;
pub mod composite;
pub mod error;
pub mod normalize;
pub mod png;
pub mod ramps;

pub use colormap::{Colormap, ColormapLut};
pub use composite::{apply_opacity, composite_native_rgb, composite_rgb, composite_single, BandParams};
pub use error::RenderError;
pub use normalize::{normalize, rescale_intensity, NodataPolicy, Normalized};
