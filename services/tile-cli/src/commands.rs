//! Subcommand implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use projection::ProjectionResolver;
use raster_common::{BandSelection, ColormapChoice, LayerConfig, PipelineSettings, RasterAsset, TileWindow};
use renderer::{png, ramps, Colormap};
use serde::Serialize;
use stac_assets::{default_selection, resolve_assets, StacItem};
use tile_decoder::{MemoryRaster, RasterSource, SourceError};
use tile_pipeline::{BandSource, RasterLayer, RasterOpener, TilePipeline, TileResult};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct AssetReport {
    pub item: String,
    pub assets: Vec<RasterAsset>,
    pub default_selection: BandSelection,
}

pub fn assets(item: &Path, include_thumbnails: bool) -> Result<AssetReport> {
    let item = StacItem::from_file(item).with_context(|| format!("reading item {}", item.display()))?;
    let assets = resolve_assets(&item, include_thumbnails)?;
    let default_selection = default_selection(&assets)?;

    Ok(AssetReport {
        item: item.id,
        assets,
        default_selection,
    })
}

pub fn colormaps() -> Vec<&'static str> {
    ramps::names()
}

pub fn swatch(name: &str, out: &Path, width: usize, height: usize) -> Result<()> {
    let colormap = Colormap::from_choice(&ColormapChoice::Named(name.to_string()))?
        .ok_or_else(|| anyhow!("'{}' is not a colormap", name))?;

    let settings = PipelineSettings::from_env();
    let lut = colormap.materialize_lut(settings.lut_resolution);
    let bytes = png::encode_lut_swatch(&lut, width, height)?;

    std::fs::write(out, bytes).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

/// Opens raster fixtures from disk by asset key.
struct FixtureOpener {
    paths: HashMap<String, PathBuf>,
}

#[async_trait]
impl RasterOpener for FixtureOpener {
    async fn open(&self, asset: &RasterAsset) -> Result<Arc<dyn RasterSource>, SourceError> {
        let path = self
            .paths
            .get(&asset.key)
            .ok_or_else(|| SourceError::NotFound(format!("no fixture for asset '{}'", asset.key)))?;
        debug!(asset = %asset.key, path = %path.display(), "Loading raster fixture");
        Ok(Arc::new(MemoryRaster::from_file(path)?))
    }
}

#[derive(Debug)]
pub struct RenderRequest {
    pub rasters: Vec<PathBuf>,
    pub config: PathBuf,
    pub item: Option<PathBuf>,
    pub level: usize,
    pub window: TileWindow,
}

/// Render one tile and write it to `out` as PNG.
///
/// With an item, band metadata comes from its assets. Without one, each
/// fixture stands in for the asset with only its sample layout known.
pub async fn render(request: &RenderRequest, out: &Path) -> Result<TileResult> {
    let settings = PipelineSettings::from_env();
    settings.validate().map_err(|e| anyhow!(e))?;

    let config = LayerConfig::from_file(&request.config)?;
    let keys: Vec<String> = config.selection.asset_keys().into_iter().map(str::to_string).collect();
    if keys.len() != request.rasters.len() {
        bail!(
            "selection uses {} band(s) ({}), got {} raster fixture(s)",
            keys.len(),
            keys.join(", "),
            request.rasters.len()
        );
    }

    let opener = FixtureOpener {
        paths: keys.iter().cloned().zip(request.rasters.iter().cloned()).collect(),
    };
    let resolver = ProjectionResolver::default();

    let layer = match &request.item {
        Some(item) => {
            let item = StacItem::from_file(item).with_context(|| format!("reading item {}", item.display()))?;
            RasterLayer::activate(&item, Some(config), &opener, &resolver, &settings).await?
        }
        None => {
            let mut assets = Vec::with_capacity(keys.len());
            let mut bands = Vec::with_capacity(keys.len());
            for (key, path) in keys.iter().zip(&request.rasters) {
                let mut asset = RasterAsset::new(key.as_str(), path.display().to_string());
                let source = opener.open(&asset).await?;
                let layout = source.sample_layout();
                asset.sample_format = layout.format();
                asset.samples_per_pixel = layout.samples_per_pixel;
                assets.push(asset.clone());
                bands.push(BandSource::new(asset, source));
            }
            let pipeline = TilePipeline::new(bands, config, &resolver)?;
            RasterLayer::from_pipeline(assets, pipeline, settings.max_concurrent_tiles)
        }
    };

    let result = layer.render_tile(request.level, request.window).await?;
    let bytes = png::encode_tile(&result.tile)?;
    std::fs::write(out, bytes).with_context(|| format!("writing {}", out.display()))?;

    Ok(result)
}
