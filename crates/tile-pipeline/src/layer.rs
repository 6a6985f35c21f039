//! Raster layer lifecycle: activation from a catalog item, batch tile
//! rendering and reconfiguration.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures::future::try_join_all;
use projection::ProjectionResolver;
use raster_common::{LayerConfig, PipelineSettings, RasterAsset, RasterError, RasterResult, TileWindow};
use stac_assets::{default_selection, resolve_assets, StacItem};
use tile_decoder::{RasterSource, SourceError};
use tracing::{error, info, instrument};

use crate::pipeline::{BandSource, TilePipeline, TileResult};

/// Opens the byte source behind a catalog asset.
///
/// Fetching, caching and retrying bytes are the opener's business.
#[async_trait]
pub trait RasterOpener: Send + Sync {
    async fn open(&self, asset: &RasterAsset) -> Result<Arc<dyn RasterSource>, SourceError>;
}

/// One displayed raster layer.
#[derive(Debug)]
pub struct RasterLayer {
    assets: Vec<RasterAsset>,
    pipeline: TilePipeline,
    max_concurrent_tiles: usize,
}

async fn open_bands(
    assets: &[RasterAsset],
    config: &LayerConfig,
    opener: &dyn RasterOpener,
) -> RasterResult<Vec<BandSource>> {
    let selected = config
        .selection
        .asset_keys()
        .into_iter()
        .map(|key| {
            assets
                .iter()
                .find(|a| a.key == key)
                .cloned()
                .ok_or_else(|| RasterError::asset_resolution(format!("selected asset '{}' is not a raster asset of the item", key)))
        })
        .collect::<RasterResult<Vec<_>>>()?;

    try_join_all(selected.into_iter().map(|asset| async move {
        let source = opener
            .open(&asset)
            .await
            .map_err(|e| RasterError::asset_resolution(format!("opening '{}' ({}): {}", asset.key, asset.href, e)))?;
        Ok::<_, RasterError>(BandSource::new(asset, source))
    }))
    .await
}

impl RasterLayer {
    /// Resolve `item`'s assets, open the selected bands and set up the pipeline.
    ///
    /// Without `config`, a default selection is derived from the assets.
    /// Any failure here is reported once and the layer is not created.
    #[instrument(skip_all, fields(item = %item.id))]
    pub async fn activate(
        item: &StacItem,
        config: Option<LayerConfig>,
        opener: &dyn RasterOpener,
        resolver: &ProjectionResolver,
        settings: &PipelineSettings,
    ) -> RasterResult<Self> {
        let result = Self::try_activate(item, config, opener, resolver, settings).await;
        if let Err(e) = &result {
            error!(error = %e, "Layer activation failed");
        }
        result
    }

    async fn try_activate(
        item: &StacItem,
        config: Option<LayerConfig>,
        opener: &dyn RasterOpener,
        resolver: &ProjectionResolver,
        settings: &PipelineSettings,
    ) -> RasterResult<Self> {
        settings.validate().map_err(RasterError::invalid_config)?;

        let assets = resolve_assets(item, false)?;
        let config = match config {
            Some(config) => config,
            None => settings.layer_config(default_selection(&assets)?),
        };

        let bands = open_bands(&assets, &config, opener).await?;
        let pipeline = TilePipeline::new(bands, config, resolver)?;

        info!(assets = assets.len(), "Layer activated");
        Ok(Self {
            assets,
            pipeline,
            max_concurrent_tiles: settings.max_concurrent_tiles,
        })
    }

    /// Wrap an already set up pipeline.
    pub fn from_pipeline(assets: Vec<RasterAsset>, pipeline: TilePipeline, max_concurrent_tiles: usize) -> Self {
        Self {
            assets,
            pipeline,
            max_concurrent_tiles: max_concurrent_tiles.max(1),
        }
    }

    /// Resolved raster assets in display order.
    pub fn assets(&self) -> &[RasterAsset] {
        &self.assets
    }

    pub fn pipeline(&self) -> &TilePipeline {
        &self.pipeline
    }

    pub async fn render_tile(&self, level: usize, window: TileWindow) -> RasterResult<TileResult> {
        self.pipeline.render_tile(level, window).await
    }

    /// Render many tiles, at most `max_concurrent_tiles` at a time.
    ///
    /// Returns one result per request, in request order. A failed tile
    /// does not affect the others.
    pub async fn render_tiles(&self, requests: &[(usize, TileWindow)]) -> Vec<RasterResult<TileResult>> {
        stream::iter(requests.iter().copied())
            .map(|(level, window)| self.pipeline.render_tile(level, window))
            .buffered(self.max_concurrent_tiles)
            .collect()
            .await
    }

    /// Apply a new configuration.
    ///
    /// The same bands are reconfigured in place. A different band
    /// selection reopens the bands and replaces the pipeline; on failure
    /// the current pipeline stays active.
    pub async fn reconfigure(
        &mut self,
        config: LayerConfig,
        opener: &dyn RasterOpener,
        resolver: &ProjectionResolver,
    ) -> RasterResult<()> {
        let current: Vec<&str> = self.pipeline.bands().iter().map(|b| b.asset.key.as_str()).collect();
        if config.selection.asset_keys() == current {
            return self.pipeline.reconfigure(config).await;
        }

        config.validate()?;
        let bands = open_bands(&self.assets, &config, opener).await?;
        self.pipeline = TilePipeline::new(bands, config, resolver)?;
        info!("Layer band selection changed");
        Ok(())
    }
}
