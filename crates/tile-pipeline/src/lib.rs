//! Tile render pipeline for raster layers.
//!
//! A [`RasterLayer`] resolves a catalog item's raster assets, opens the
//! selected bands and builds a [`TilePipeline`]. Per tile the pipeline
//! decodes one or three bands, composites them with the
//! [`TileDecodeStrategy`] chosen for the sample format, runs the
//! remaining [`stages`] against the cached colormap LUT and applies the
//! layer opacity.

pub mod layer;
pub mod lut_cache;
pub mod metrics;
pub mod pipeline;
pub mod stages;
pub mod strategy;

pub use layer::{RasterLayer, RasterOpener};
pub use lut_cache::ColormapTextureCache;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{BandSource, TilePipeline, TileResult};
pub use stages::{build_stages, PipelineStages, Stage};
pub use strategy::{
    select_strategy, BandComposite, EightBitDirect, FloatNormalized, RenderParams, RgbNative, SixteenBitNormalized,
    TileDecodeStrategy,
};
