//! Post-composite pipeline stages.
//!
//! Stages mirror the shader-side path: they read the raw 8-bit value
//! from the red channel of a tile that is not yet final color, and are
//! skipped entirely for pre-normalized tiles.

use std::sync::Arc;

use raster_common::{LayerConfig, RenderedTile, RescaleRange};
use renderer::normalize::to_byte;
use renderer::{rescale_intensity, BandParams, ColormapLut, NodataPolicy};

use crate::strategy::TileDecodeStrategy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Clear alpha where the raw value is nodata.
    NodataFilter(NodataPolicy),
    /// Map the raw value through the rescale window.
    Rescale(RescaleRange),
    /// Replace the intensity with the colormap LUT entry.
    ColormapLookup,
}

/// The strategy chosen for a layer and the stages that follow it.
#[derive(Debug, Clone)]
pub struct PipelineStages {
    pub strategy: Arc<dyn TileDecodeStrategy>,
    pub stages: Vec<Stage>,
}

/// Stages for `config` rendered with `strategy`; `band` is the first
/// selected band's normalization.
///
/// Empty when the strategy already produces final color. An 8-bit
/// identity rescale without scale/offset is left out.
pub fn build_stages(config: &LayerConfig, strategy: Arc<dyn TileDecodeStrategy>, band: &BandParams) -> PipelineStages {
    let mut stages = Vec::new();

    if !strategy.pre_normalizes() {
        stages.push(Stage::NodataFilter(band.nodata));
        if !band.rescale.is_byte_identity() || band.scale_offset.is_some() {
            stages.push(Stage::Rescale(band.rescale));
        }
        if !config.selection.colormap().is_none() {
            stages.push(Stage::ColormapLookup);
        }
    }

    PipelineStages { strategy, stages }
}

impl PipelineStages {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn needs_lut(&self) -> bool {
        self.stages.contains(&Stage::ColormapLookup)
    }

    /// Run the stages over `tile` in order and mark it pre-normalized.
    ///
    /// A pre-normalized tile is returned untouched. `scale_offset` is the
    /// band's physical-value transform, applied before rescaling.
    pub fn apply(&self, tile: &mut RenderedTile, scale_offset: Option<(f64, f64)>, lut: Option<&ColormapLut>) {
        if tile.pre_normalized {
            return;
        }

        for px in tile.rgba.chunks_exact_mut(4) {
            let raw = px[0] as f64;
            for stage in &self.stages {
                if px[3] == 0 {
                    break;
                }
                match stage {
                    Stage::NodataFilter(policy) => {
                        if policy.is_nodata(raw) {
                            px.copy_from_slice(&[0, 0, 0, 0]);
                        }
                    }
                    Stage::Rescale(range) => {
                        let value = match scale_offset {
                            Some((scale, offset)) => raw * scale + offset,
                            None => raw,
                        };
                        let v = to_byte(rescale_intensity(value, range));
                        px[..3].copy_from_slice(&[v, v, v]);
                    }
                    Stage::ColormapLookup => {
                        if let Some(lut) = lut {
                            let c = lut.lookup(px[0] as f32 / 255.0);
                            px[..3].copy_from_slice(&c[..3]);
                        }
                    }
                }
            }
        }

        tile.pre_normalized = true;
    }
}
