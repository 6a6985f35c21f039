//! Tile decode strategies, one per sample-format family.
//!
//! The strategy is chosen once per layer from the source's sample layout
//! and the band selection, never per tile.

use std::fmt::Debug;
use std::sync::Arc;

use raster_common::{BandSelection, DecodedTile, RasterError, RasterResult, RenderedTile, SampleFormat, SampleBuffer};
use renderer::{composite_native_rgb, composite_rgb, composite_single, BandParams, Colormap, RenderError};
use tile_decoder::SampleLayout;

/// Per-layer inputs every strategy renders with.
#[derive(Debug, Clone)]
pub struct RenderParams {
    /// One entry per selected band, in selection order.
    pub bands: Vec<BandParams>,
    pub colormap: Option<Arc<Colormap>>,
    pub zero_as_nodata: bool,
}

/// Turns the decoded tiles of one request into an RGBA tile.
pub trait TileDecodeStrategy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Whether the output is final color. When false the pipeline
    /// stages (nodata filter, rescale, colormap lookup) still run.
    fn pre_normalizes(&self) -> bool {
        true
    }

    /// `bands` holds one decoded tile per selected band.
    fn render(&self, bands: &[DecodedTile], params: &RenderParams) -> Result<RenderedTile, RenderError>;
}

fn expect_bands(bands: &[DecodedTile], count: usize) -> Result<(), RenderError> {
    if bands.len() != count {
        return Err(RenderError::BandCount {
            expected: count,
            actual: bands.len(),
        });
    }
    Ok(())
}

fn first_params(params: &RenderParams) -> Result<&BandParams, RenderError> {
    params.bands.first().ok_or(RenderError::BandCount {
        expected: 1,
        actual: 0,
    })
}

/// Raw 8-bit samples replicated into gray RGBA, left to the stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EightBitDirect;

impl TileDecodeStrategy for EightBitDirect {
    fn name(&self) -> &'static str {
        "8bit_direct"
    }

    fn pre_normalizes(&self) -> bool {
        false
    }

    fn render(&self, bands: &[DecodedTile], _params: &RenderParams) -> Result<RenderedTile, RenderError> {
        expect_bands(bands, 1)?;
        let tile = &bands[0];
        let SampleBuffer::Uint8(samples) = &tile.samples else {
            return Err(RenderError::SampleLayout(format!("8-bit direct needs uint8, got {}", tile.format())));
        };
        if tile.samples_per_pixel != 1 || samples.len() != tile.pixel_count() {
            return Err(RenderError::SampleLayout(format!(
                "{}x{} tile holds {} samples",
                tile.width,
                tile.height,
                samples.len()
            )));
        }

        let rgba = samples.iter().flat_map(|&v| [v, v, v, 255]).collect();
        Ok(RenderedTile {
            rgba,
            width: tile.width,
            height: tile.height,
            pre_normalized: false,
        })
    }
}

/// 16-bit integer samples, normalized and colormapped on the CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct SixteenBitNormalized;

impl TileDecodeStrategy for SixteenBitNormalized {
    fn name(&self) -> &'static str {
        "16bit_normalized"
    }

    fn render(&self, bands: &[DecodedTile], params: &RenderParams) -> Result<RenderedTile, RenderError> {
        expect_bands(bands, 1)?;
        composite_single(&bands[0], first_params(params)?, params.colormap.as_deref())
    }
}

/// Floating-point samples; NaN is always nodata.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatNormalized;

impl TileDecodeStrategy for FloatNormalized {
    fn name(&self) -> &'static str {
        "float_normalized"
    }

    fn render(&self, bands: &[DecodedTile], params: &RenderParams) -> Result<RenderedTile, RenderError> {
        expect_bands(bands, 1)?;
        composite_single(&bands[0], first_params(params)?, params.colormap.as_deref())
    }
}

/// Pre-packed 8-bit RGB triples in one asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbNative;

impl TileDecodeStrategy for RgbNative {
    fn name(&self) -> &'static str {
        "rgb_native"
    }

    fn render(&self, bands: &[DecodedTile], params: &RenderParams) -> Result<RenderedTile, RenderError> {
        expect_bands(bands, 1)?;
        composite_native_rgb(&bands[0], params.zero_as_nodata)
    }
}

/// Three single-band assets composited as red, green, blue.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandComposite;

impl TileDecodeStrategy for BandComposite {
    fn name(&self) -> &'static str {
        "band_composite"
    }

    fn render(&self, bands: &[DecodedTile], params: &RenderParams) -> Result<RenderedTile, RenderError> {
        expect_bands(bands, 3)?;
        let [r, g, b] = params.bands.as_slice() else {
            return Err(RenderError::BandCount {
                expected: 3,
                actual: params.bands.len(),
            });
        };
        composite_rgb([&bands[0], &bands[1], &bands[2]], &[*r, *g, *b], params.zero_as_nodata)
    }
}

/// Pick the strategy for `selection` over sources with `layouts`.
///
/// Fails for layouts no strategy renders, which halts layer activation.
pub fn select_strategy(selection: &BandSelection, layouts: &[SampleLayout]) -> RasterResult<Arc<dyn TileDecodeStrategy>> {
    let keys = selection.asset_keys();
    if layouts.len() != keys.len() {
        return Err(RasterError::invalid_config(format!(
            "selection names {} assets but {} sources were opened",
            keys.len(),
            layouts.len()
        )));
    }

    let unsupported = |key: &str, layout: &SampleLayout| {
        RasterError::invalid_config(format!(
            "asset '{}' has unsupported samples: {}-bit {:?} x{}",
            key, layout.bits_per_sample, layout.kind, layout.samples_per_pixel
        ))
    };

    if selection.is_rgb() {
        for (key, layout) in keys.iter().zip(layouts) {
            if layout.samples_per_pixel != 1 || layout.format().is_none() {
                return Err(unsupported(key, layout));
            }
        }
        return Ok(Arc::new(BandComposite));
    }

    let layout = &layouts[0];
    let format = layout.format().ok_or_else(|| unsupported(keys[0], layout))?;

    let strategy: Arc<dyn TileDecodeStrategy> = match (format, layout.samples_per_pixel) {
        (SampleFormat::Uint8, 3) => Arc::new(RgbNative),
        (SampleFormat::Uint8, 1) => Arc::new(EightBitDirect),
        (SampleFormat::Uint16 | SampleFormat::Int16, 1) => Arc::new(SixteenBitNormalized),
        (SampleFormat::Float32 | SampleFormat::Float64, 1) => Arc::new(FloatNormalized),
        _ => return Err(unsupported(keys[0], layout)),
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{ColormapChoice, RescaleRange, SampleKind};
    use renderer::NodataPolicy;

    fn single() -> BandSelection {
        BandSelection::single("b", ColormapChoice::None, RescaleRange::new(0.0, 255.0))
    }

    #[test]
    fn test_select_by_format() {
        let pick = |format, spp| select_strategy(&single(), &[SampleLayout::of(format, spp)]).unwrap().name();
        assert_eq!(pick(SampleFormat::Uint8, 1), "8bit_direct");
        assert_eq!(pick(SampleFormat::Uint8, 3), "rgb_native");
        assert_eq!(pick(SampleFormat::Uint16, 1), "16bit_normalized");
        assert_eq!(pick(SampleFormat::Int16, 1), "16bit_normalized");
        assert_eq!(pick(SampleFormat::Float64, 1), "float_normalized");
    }

    #[test]
    fn test_select_rejects_unsupported() {
        let err = select_strategy(&single(), &[SampleLayout::new(32, SampleKind::Unsigned, 1)]).unwrap_err();
        assert!(err.is_fatal_for_layer());
        assert!(select_strategy(&single(), &[SampleLayout::of(SampleFormat::Uint16, 3)]).is_err());

        let rgb = BandSelection::rgb("r", "g", "b", RescaleRange::new(0.0, 1.0));
        let one = SampleLayout::of(SampleFormat::Uint16, 1);
        assert!(select_strategy(&rgb, &[one, one]).is_err());
        assert_eq!(select_strategy(&rgb, &[one, one, one]).unwrap().name(), "band_composite");
    }

    #[test]
    fn test_eight_bit_direct_leaves_raw_bytes() {
        let tile = DecodedTile::single(SampleBuffer::Uint8(vec![0, 17]), 2, 1);
        let params = RenderParams {
            bands: vec![BandParams::new(NodataPolicy::declared(None), RescaleRange::new(0.0, 255.0))],
            colormap: None,
            zero_as_nodata: true,
        };
        let out = EightBitDirect.render(&[tile], &params).unwrap();
        assert!(!out.pre_normalized);
        assert_eq!(out.rgba, vec![0, 0, 0, 255, 17, 17, 17, 255]);
    }

    #[test]
    fn test_composite_band_count_checked() {
        let tile = DecodedTile::single(SampleBuffer::Uint16(vec![1]), 1, 1);
        let params = RenderParams {
            bands: vec![],
            colormap: None,
            zero_as_nodata: true,
        };
        assert!(matches!(
            BandComposite.render(&[tile], &params),
            Err(RenderError::BandCount { expected: 3, actual: 1 })
        ));
    }
}
