//! Band compositing: decoded sample tiles to RGBA.
//!
//! Every compositor here produces final color, so the tiles it returns
//! are flagged `pre_normalized`. Rows are processed in parallel with rayon.

use rayon::prelude::*;
use raster_common::{DecodedTile, RenderedTile, RescaleRange, Rgb, SampleFormat};

use crate::colormap::Colormap;
use crate::error::{RenderError, Result};
use crate::normalize::{rescale_intensity, to_byte, NodataPolicy, Normalized};

/// Per-band normalization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    pub nodata: NodataPolicy,
    pub rescale: RescaleRange,
    /// `(scale, offset)` applied to non-nodata samples before rescaling.
    pub scale_offset: Option<(f64, f64)>,
}

impl BandParams {
    pub fn new(nodata: NodataPolicy, rescale: RescaleRange) -> Self {
        Self {
            nodata,
            rescale,
            scale_offset: None,
        }
    }

    pub fn with_scale_offset(mut self, scale: f64, offset: f64) -> Self {
        self.scale_offset = Some((scale, offset));
        self
    }

    #[inline]
    fn physical(&self, raw: f64) -> f64 {
        match self.scale_offset {
            Some((scale, offset)) => raw * scale + offset,
            None => raw,
        }
    }

    /// Nodata is decided on the raw sample; rescaling sees the physical value.
    #[inline]
    pub fn normalize(&self, raw: f64) -> Normalized {
        if self.nodata.is_nodata(raw) {
            return Normalized::NODATA;
        }
        Normalized {
            intensity: rescale_intensity(self.physical(raw), &self.rescale),
            is_nodata: false,
        }
    }
}

fn check_layout(tile: &DecodedTile, samples_per_pixel: usize) -> Result<()> {
    if tile.samples_per_pixel != samples_per_pixel {
        return Err(RenderError::BandCount {
            expected: samples_per_pixel,
            actual: tile.samples_per_pixel,
        });
    }
    let expected = tile.pixel_count() * samples_per_pixel;
    if tile.samples.len() != expected {
        return Err(RenderError::SampleLayout(format!(
            "{}x{} tile needs {} samples, buffer holds {}",
            tile.width,
            tile.height,
            expected,
            tile.samples.len()
        )));
    }
    Ok(())
}

#[inline]
fn write_pixel(px: &mut [u8], color: Rgb, alpha: u8) {
    px[0] = color.r;
    px[1] = color.g;
    px[2] = color.b;
    px[3] = alpha;
}

/// Single band to grayscale or colormapped RGBA.
///
/// Nodata pixels get alpha 0 whatever the colormap or rescale range.
pub fn composite_single(tile: &DecodedTile, params: &BandParams, colormap: Option<&Colormap>) -> Result<RenderedTile> {
    check_layout(tile, 1)?;

    let mut out = RenderedTile::transparent(tile.width, tile.height, true);
    if tile.pixel_count() == 0 {
        return Ok(out);
    }

    let width = tile.width;
    out.rgba
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let raw = tile.samples.get_f64(y * width + x).unwrap_or(f64::NAN);
                let n = params.normalize(raw);
                if n.is_nodata {
                    continue;
                }
                let color = match colormap {
                    Some(cmap) => cmap.interpolate(n.intensity),
                    None => Rgb::gray(to_byte(n.intensity)),
                };
                write_pixel(px, color, 255);
            }
        });

    Ok(out)
}

/// Raw sample that counts towards the joint RGB transparency rule.
#[inline]
fn is_empty_sample(raw: f64, zero_as_nodata: bool) -> bool {
    raw.is_nan() || (zero_as_nodata && raw == 0.0)
}

/// Three co-registered bands to RGB.
///
/// Transparency is decided on the raw triple: with `zero_as_nodata`, a
/// pixel whose three samples are exactly zero gets alpha 0 (NaN counts as
/// zero). Declared per-band nodata never hides a pixel; it only sets that
/// band's channel to 0.
pub fn composite_rgb(bands: [&DecodedTile; 3], params: &[BandParams; 3], zero_as_nodata: bool) -> Result<RenderedTile> {
    let [red, green, blue] = bands;
    for band in bands {
        check_layout(band, 1)?;
        if !band.same_geometry(red) {
            return Err(RenderError::DimensionMismatch {
                expected: (red.width, red.height),
                actual: (band.width, band.height),
            });
        }
    }

    let mut out = RenderedTile::transparent(red.width, red.height, true);
    if red.pixel_count() == 0 {
        return Ok(out);
    }

    let width = red.width;
    out.rgba
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let idx = y * width + x;
                let raw = [
                    red.samples.get_f64(idx).unwrap_or(f64::NAN),
                    green.samples.get_f64(idx).unwrap_or(f64::NAN),
                    blue.samples.get_f64(idx).unwrap_or(f64::NAN),
                ];
                if raw.iter().all(|&v| is_empty_sample(v, zero_as_nodata)) {
                    continue;
                }

                let [r, g, b] = [params[0].normalize(raw[0]), params[1].normalize(raw[1]), params[2].normalize(raw[2])];

                let color = Rgb::new(to_byte(r.intensity), to_byte(g.intensity), to_byte(b.intensity));
                write_pixel(px, color, 255);
            }
        });

    Ok(out)
}

/// Pre-packed 8-bit RGB triples, copied through without normalization.
///
/// With `zero_as_nodata`, an all-zero triple becomes transparent.
pub fn composite_native_rgb(tile: &DecodedTile, zero_as_nodata: bool) -> Result<RenderedTile> {
    check_layout(tile, 3)?;

    let raster_common::SampleBuffer::Uint8(samples) = &tile.samples else {
        return Err(RenderError::SampleLayout(format!(
            "native RGB needs uint8 samples, got {}",
            tile.format()
        )));
    };

    let mut out = RenderedTile::transparent(tile.width, tile.height, true);
    if tile.pixel_count() == 0 {
        return Ok(out);
    }

    let width = tile.width;
    out.rgba
        .par_chunks_mut(width * 4)
        .zip(samples.par_chunks(width * 3))
        .for_each(|(row, src)| {
            for (px, rgb) in row.chunks_exact_mut(4).zip(src.chunks_exact(3)) {
                if zero_as_nodata && rgb == [0, 0, 0] {
                    continue;
                }
                write_pixel(px, Rgb::new(rgb[0], rgb[1], rgb[2]), 255);
            }
        });

    Ok(out)
}

/// Multiply every alpha by `opacity` (clamped to [0, 1]).
pub fn apply_opacity(tile: &mut RenderedTile, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    tile.rgba.par_chunks_mut(4).for_each(|px| {
        px[3] = (px[3] as f32 * opacity).round() as u8;
    });
}

/// Whether `format` can go through [`composite_native_rgb`].
pub fn is_native_rgb_format(format: SampleFormat, samples_per_pixel: usize) -> bool {
    format == SampleFormat::Uint8 && samples_per_pixel == 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::SampleBuffer;

    fn params(nodata: Option<f64>, format: SampleFormat, rescale: RescaleRange) -> BandParams {
        BandParams::new(NodataPolicy::new(nodata, format, true), rescale)
    }

    #[test]
    fn test_single_layout_errors() {
        let tile = DecodedTile::new(SampleBuffer::Uint8(vec![1, 2, 3]), 1, 2, 2);
        let p = params(None, SampleFormat::Uint8, RescaleRange::new(0.0, 255.0));
        assert!(matches!(composite_single(&tile, &p, None), Err(RenderError::SampleLayout(_))));

        let tile = DecodedTile::new(SampleBuffer::Uint8(vec![1; 12]), 3, 2, 2);
        assert!(matches!(
            composite_single(&tile, &p, None),
            Err(RenderError::BandCount { expected: 1, actual: 3 })
        ));
    }

    #[test]
    fn test_scale_offset_applied_after_nodata() {
        let tile = DecodedTile::single(SampleBuffer::Uint16(vec![0, 200, 2200]), 3, 1);
        let p = params(Some(0.0), SampleFormat::Uint16, RescaleRange::new(0.0, 1000.0)).with_scale_offset(0.5, -100.0);
        let out = composite_single(&tile, &p, None).unwrap();
        assert_eq!(out.alphas(), vec![0, 255, 255]);
        // 200 * 0.5 - 100 = 0, 2200 * 0.5 - 100 = 1000
        assert_eq!(out.pixel(1, 0).unwrap()[0], 0);
        assert_eq!(out.pixel(2, 0).unwrap()[0], 255);
    }

    #[test]
    fn test_native_rgb_requires_uint8() {
        let tile = DecodedTile::new(SampleBuffer::Uint16(vec![0; 3]), 3, 1, 1);
        assert!(matches!(composite_native_rgb(&tile, true), Err(RenderError::SampleLayout(_))));
    }

    #[test]
    fn test_native_rgb_zero_rule_toggle() {
        let tile = DecodedTile::new(SampleBuffer::Uint8(vec![0, 0, 0, 10, 0, 0]), 3, 2, 1);
        assert_eq!(composite_native_rgb(&tile, true).unwrap().alphas(), vec![0, 255]);
        assert_eq!(composite_native_rgb(&tile, false).unwrap().alphas(), vec![255, 255]);
    }

    #[test]
    fn test_opacity() {
        let mut tile = RenderedTile {
            rgba: vec![1, 2, 3, 255, 0, 0, 0, 0],
            width: 2,
            height: 1,
            pre_normalized: true,
        };
        apply_opacity(&mut tile, 0.5);
        assert_eq!(tile.alphas(), vec![128, 0]);
        assert_eq!(&tile.rgba[0..3], &[1, 2, 3]);
    }

    #[test]
    fn test_empty_tile() {
        let tile = DecodedTile::single(SampleBuffer::Uint8(vec![]), 0, 0);
        let p = params(None, SampleFormat::Uint8, RescaleRange::new(0.0, 255.0));
        let out = composite_single(&tile, &p, None).unwrap();
        assert!(out.rgba.is_empty());
    }
}
