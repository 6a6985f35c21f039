//! The raster byte-source abstraction.

use async_trait::async_trait;
use projection::GeoKeys;
use raster_common::{GeoTransform, SampleBuffer, SampleFormat, SampleKind, TileWindow};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// How samples are encoded in a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleLayout {
    pub bits_per_sample: u16,
    pub kind: SampleKind,
    #[serde(default = "default_samples_per_pixel")]
    pub samples_per_pixel: usize,
}

fn default_samples_per_pixel() -> usize {
    1
}

impl SampleLayout {
    pub fn new(bits_per_sample: u16, kind: SampleKind, samples_per_pixel: usize) -> Self {
        Self {
            bits_per_sample,
            kind,
            samples_per_pixel,
        }
    }

    /// Layout of a supported sample format.
    pub fn of(format: SampleFormat, samples_per_pixel: usize) -> Self {
        let kind = match format {
            SampleFormat::Uint8 | SampleFormat::Uint16 => SampleKind::Unsigned,
            SampleFormat::Int16 => SampleKind::Signed,
            SampleFormat::Float32 | SampleFormat::Float64 => SampleKind::Float,
        };
        Self::new(format.bits_per_sample(), kind, samples_per_pixel)
    }

    /// Supported format for this layout, if any.
    pub fn format(&self) -> Option<SampleFormat> {
        SampleFormat::from_tiff(self.bits_per_sample, self.kind)
    }
}

/// A tiled, multi-resolution raster (e.g. a Cloud-Optimized GeoTIFF).
///
/// Level 0 is the full-resolution image; higher levels are overviews.
/// Implementations own the byte fetching and caching; the pipeline only
/// uses the operations below.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Stable identifier, used to key per-raster caches.
    fn id(&self) -> &str;

    /// Number of images (full resolution plus overviews).
    fn image_count(&self) -> usize;

    /// Width and height of one image, `None` if the level does not exist.
    fn dimensions(&self, level: usize) -> Option<(usize, usize)>;

    /// Sample encoding, shared by all levels.
    fn sample_layout(&self) -> SampleLayout;

    /// Embedded projection keys, if any.
    fn geo_keys(&self) -> Option<GeoKeys>;

    /// Pixel-to-model transform of the full-resolution image.
    fn geo_transform(&self) -> Option<GeoTransform>;

    /// Read the samples of `window` at `level`, pixel-interleaved.
    async fn read_rasters(&self, level: usize, window: TileWindow) -> Result<SampleBuffer, SourceError>;
}

/// All levels as `(index, width, height)`.
pub fn levels(source: &dyn RasterSource) -> Vec<(usize, usize, usize)> {
    (0..source.image_count())
        .filter_map(|i| source.dimensions(i).map(|(w, h)| (i, w, h)))
        .collect()
}

/// Geotransform of `level`, scaled from the full-resolution transform.
pub fn level_geo_transform(source: &dyn RasterSource, level: usize) -> Option<GeoTransform> {
    let base = source.geo_transform()?;
    let (full_w, full_h) = source.dimensions(0)?;
    let (w, h) = source.dimensions(level)?;
    if w == 0 || h == 0 {
        return None;
    }
    Some(base.scaled(full_w as f64 / w as f64, full_h as f64 / h as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_format() {
        assert_eq!(SampleLayout::of(SampleFormat::Int16, 1).format(), Some(SampleFormat::Int16));
        assert_eq!(SampleLayout::new(32, SampleKind::Signed, 1).format(), None);
        assert_eq!(SampleLayout::new(1, SampleKind::Unsigned, 1).format(), None);
    }
}
