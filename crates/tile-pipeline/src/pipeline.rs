//! The per-layer tile render pipeline.
//!
//! Setup (projection resolution, overview matching, strategy and stage
//! selection) happens once in [`TilePipeline::new`]. Each
//! [`TilePipeline::render_tile`] call only decodes, composites and runs
//! the stages, and holds no state across tiles except the LUT cache.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use projection::{ProjectionContext, ProjectionResolver};
use raster_common::{
    DecodedTile, LayerConfig, LonLatBounds, RasterAsset, RasterError, RasterResult, RenderedTile, RescaleRange,
    SampleFormat, TileWindow,
};
use renderer::{apply_opacity, BandParams, Colormap, NodataPolicy};
use tile_decoder::{decode, level_geo_transform, match_levels, RasterSource, SampleLayout};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::lut_cache::ColormapTextureCache;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::stages::{build_stages, PipelineStages};
use crate::strategy::{select_strategy, RenderParams};

/// A selected asset and the source its pixels are read from.
#[derive(Clone)]
pub struct BandSource {
    pub asset: RasterAsset,
    pub source: Arc<dyn RasterSource>,
}

impl BandSource {
    pub fn new(asset: RasterAsset, source: Arc<dyn RasterSource>) -> Self {
        Self { asset, source }
    }
}

impl fmt::Debug for BandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandSource")
            .field("asset", &self.asset.key)
            .field("source", &self.source.id())
            .finish()
    }
}

/// A rendered tile and where it lies on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct TileResult {
    pub tile: RenderedTile,
    pub level: usize,
    pub window: TileWindow,
    /// Geographic extent, when the raster has a geotransform.
    pub bounds: Option<LonLatBounds>,
}

/// Everything derived from one layer configuration.
///
/// Swapped as a whole on reconfiguration, so a tile render sees either
/// the old or the new configuration, never a mix.
#[derive(Debug)]
struct ActiveLayer {
    config: LayerConfig,
    stages: PipelineStages,
    params: RenderParams,
}

pub struct TilePipeline {
    bands: Vec<BandSource>,
    projection: Arc<ProjectionContext>,
    /// Per reference level, the matched level of every band (`None` when
    /// some band has no overview of that size).
    level_map: Vec<Option<Vec<usize>>>,
    active: RwLock<Arc<ActiveLayer>>,
    lut_cache: ColormapTextureCache,
    metrics: Arc<PipelineMetrics>,
}

impl fmt::Debug for TilePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TilePipeline")
            .field("bands", &self.bands)
            .field("projection", &self.projection)
            .field("level_map", &self.level_map)
            .finish_non_exhaustive()
    }
}

fn check_bands(config: &LayerConfig, bands: &[BandSource]) -> RasterResult<()> {
    let keys = config.selection.asset_keys();
    let opened: Vec<&str> = bands.iter().map(|b| b.asset.key.as_str()).collect();
    if keys != opened {
        return Err(RasterError::invalid_config(format!(
            "selection {:?} does not match opened bands {:?}",
            keys, opened
        )));
    }
    Ok(())
}

fn band_params(config: &LayerConfig, asset: &RasterAsset, layout: &SampleLayout) -> BandParams {
    let format = layout.format().unwrap_or(SampleFormat::Uint8);
    let nodata = NodataPolicy::new(asset.nodata, format, config.zero_as_nodata);
    let rescale = config
        .selection
        .rescale()
        .unwrap_or_else(|| RescaleRange::for_format(format));

    let params = BandParams::new(nodata, rescale);
    if config.apply_scale_offset && (asset.scale.is_some() || asset.offset.is_some()) {
        params.with_scale_offset(asset.scale.unwrap_or(1.0), asset.offset.unwrap_or(0.0))
    } else {
        params
    }
}

fn plan(bands: &[BandSource], config: LayerConfig) -> RasterResult<ActiveLayer> {
    let layouts: Vec<SampleLayout> = bands.iter().map(|b| b.source.sample_layout()).collect();
    let strategy = select_strategy(&config.selection, &layouts)?;

    let colormap = Colormap::from_choice(config.selection.colormap())
        .map_err(|e| RasterError::invalid_config(e.to_string()))?
        .map(Arc::new);

    let params: Vec<BandParams> = bands
        .iter()
        .zip(&layouts)
        .map(|(band, layout)| band_params(&config, &band.asset, layout))
        .collect();

    let first = params
        .first()
        .copied()
        .ok_or_else(|| RasterError::invalid_config("no bands selected"))?;
    let stages = build_stages(&config, strategy, &first);

    Ok(ActiveLayer {
        params: RenderParams {
            bands: params,
            colormap,
            zero_as_nodata: config.zero_as_nodata,
        },
        stages,
        config,
    })
}

fn build_level_map(bands: &[BandSource]) -> Vec<Option<Vec<usize>>> {
    let reference = bands[0].source.as_ref();
    let others: Vec<&dyn RasterSource> = bands[1..].iter().map(|b| b.source.as_ref()).collect();

    (0..reference.image_count())
        .map(|level| match match_levels(reference, level, &others) {
            Ok(matched) => Some(std::iter::once(level).chain(matched).collect()),
            Err(e) => {
                debug!(level, error = %e, "No matching overview across bands");
                None
            }
        })
        .collect()
}

async fn decode_band(band: &BandSource, level: usize, window: TileWindow) -> RasterResult<DecodedTile> {
    decode(band.source.as_ref(), level, window)
        .await
        .map_err(|e| e.into_raster_error(&band.asset.key, level))
}

impl TilePipeline {
    /// Set up a pipeline for `bands` (one, or three for RGB) under `config`.
    ///
    /// Resolves the projection of the first band once; a projection
    /// failure degrades to an identity context. Any other setup failure
    /// is fatal for the layer.
    pub fn new(bands: Vec<BandSource>, config: LayerConfig, resolver: &ProjectionResolver) -> RasterResult<Self> {
        config.validate()?;
        check_bands(&config, &bands)?;

        let reference = bands[0].source.as_ref();
        let projection = resolver.resolve(reference.id(), reference.geo_keys().as_ref());
        let level_map = build_level_map(&bands);
        let active = plan(&bands, config)?;

        info!(
            asset = %bands[0].asset.key,
            strategy = active.stages.strategy.name(),
            stages = active.stages.stages.len(),
            projection = projection.definition(),
            levels = level_map.len(),
            "Tile pipeline ready"
        );

        let metrics = Arc::new(PipelineMetrics::new());
        Ok(Self {
            bands,
            projection,
            level_map,
            active: RwLock::new(Arc::new(active)),
            lut_cache: ColormapTextureCache::new(metrics.clone()),
            metrics,
        })
    }

    fn key(&self) -> &str {
        &self.bands[0].asset.key
    }

    pub fn bands(&self) -> &[BandSource] {
        &self.bands
    }

    pub fn projection(&self) -> &ProjectionContext {
        &self.projection
    }

    pub fn lut_cache(&self) -> &ColormapTextureCache {
        &self.lut_cache
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn config(&self) -> LayerConfig {
        self.active.read().await.config.clone()
    }

    pub async fn strategy_name(&self) -> &'static str {
        self.active.read().await.stages.strategy.name()
    }

    /// Levels to decode for each band when the reference is at `level`.
    pub fn band_levels(&self, level: usize) -> RasterResult<Vec<usize>> {
        match self.level_map.get(level) {
            Some(Some(levels)) => Ok(levels.clone()),
            Some(None) => Err(RasterError::DimensionMismatch(format!(
                "no overview of every band matches '{}' level {}",
                self.key(),
                level
            ))),
            None => Err(RasterError::tile_decode(
                self.key(),
                level,
                format!("level does not exist (raster has {} images)", self.level_map.len()),
            )),
        }
    }

    /// Swap in a new configuration for the same bands.
    ///
    /// The LUT cache is invalidated when the colormap identity or LUT
    /// resolution changes. A different band selection needs a new
    /// pipeline.
    pub async fn reconfigure(&self, config: LayerConfig) -> RasterResult<()> {
        config.validate()?;
        check_bands(&config, &self.bands)?;
        let next = Arc::new(plan(&self.bands, config)?);

        let mut active = self.active.write().await;
        let identity = |layer: &ActiveLayer| layer.params.colormap.as_ref().map(|c| c.identity().to_string());
        let lut_changed =
            identity(&**active) != identity(&*next) || active.config.lut_resolution != next.config.lut_resolution;

        if lut_changed {
            self.lut_cache.invalidate().await;
        }
        info!(asset = %self.key(), lut_changed, "Layer reconfigured");
        *active = next;
        Ok(())
    }

    /// Decode, composite and finish one tile.
    ///
    /// Failures are per tile: they are logged and counted, and later
    /// calls are unaffected. Nothing is retried.
    #[instrument(skip(self, window), fields(asset = %self.key(), x = window.x, y = window.y))]
    pub async fn render_tile(&self, level: usize, window: TileWindow) -> RasterResult<TileResult> {
        let started = Instant::now();
        let active = self.active.read().await.clone();

        match self.render_with(&active, level, window).await {
            Ok(result) => {
                self.metrics.record_tile(active.stages.strategy.name(), started.elapsed());
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, width = window.width, height = window.height, "Tile render failed");
                self.metrics.record_error(e.kind());
                Err(e)
            }
        }
    }

    async fn render_with(&self, active: &ActiveLayer, level: usize, window: TileWindow) -> RasterResult<TileResult> {
        let decoded = self.decode_bands(level, window).await?;
        let mut tile = active.stages.strategy.render(&decoded, &active.params)?;

        if !tile.pre_normalized {
            let lut = match &active.params.colormap {
                Some(colormap) if active.stages.needs_lut() => {
                    Some(self.lut_cache.get_or_build(colormap, active.config.lut_resolution).await)
                }
                _ => None,
            };
            let scale_offset = active.params.bands.first().and_then(|b| b.scale_offset);
            active.stages.apply(&mut tile, scale_offset, lut.as_deref());
        }

        apply_opacity(&mut tile, active.config.opacity);

        Ok(TileResult {
            bounds: self.tile_bounds(level, window),
            tile,
            level,
            window,
        })
    }

    /// Decode every band; RGB bands are decoded concurrently.
    async fn decode_bands(&self, level: usize, window: TileWindow) -> RasterResult<Vec<DecodedTile>> {
        let levels = self.band_levels(level)?;

        match (self.bands.as_slice(), levels.as_slice()) {
            ([band], _) => Ok(vec![decode_band(band, level, window).await?]),
            ([r, g, b], [lr, lg, lb]) => {
                let (r, g, b) = tokio::try_join!(
                    decode_band(r, *lr, window),
                    decode_band(g, *lg, window),
                    decode_band(b, *lb, window),
                )?;
                Ok(vec![r, g, b])
            }
            (bands, levels) => Err(RasterError::DimensionMismatch(format!(
                "{} bands but {} matched levels",
                bands.len(),
                levels.len()
            ))),
        }
    }

    /// Lon/lat extent of `window` at `level`, through the cached projection.
    pub fn tile_bounds(&self, level: usize, window: TileWindow) -> Option<LonLatBounds> {
        let transform = level_geo_transform(self.bands[0].source.as_ref(), level)?;

        let (x0, y0) = (window.x as f64, window.y as f64);
        let (x1, y1) = (x0 + window.width as f64, y0 + window.height as f64);
        let (xm, ym) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

        // Corners and edge midpoints; projected edges are not straight.
        let points: Vec<(f64, f64)> = [(x0, y0), (xm, y0), (x1, y0), (x1, ym), (x1, y1), (xm, y1), (x0, y1), (x0, ym)]
            .into_iter()
            .map(|(col, row)| transform.pixel_to_model(col, row))
            .filter_map(|(x, y)| self.projection.forward(x, y).ok())
            .collect();

        LonLatBounds::enclosing(&points)
    }
}
