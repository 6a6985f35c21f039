//! In-memory raster source.
//!
//! Holds already-decoded pixels for every level. Used by tests, by the
//! CLI's JSON fixtures, and by hosts that decode images elsewhere.

use std::path::Path;

use async_trait::async_trait;
use projection::GeoKeys;
use raster_common::{GeoTransform, SampleBuffer, TileWindow};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::source::{RasterSource, SampleLayout};

/// One image (full resolution or overview).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLevel {
    pub width: usize,
    pub height: usize,
    pub samples: SampleBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRaster {
    pub id: String,
    /// Overrides the layout derived from the samples, e.g. to describe
    /// an encoding the pipeline cannot render.
    #[serde(default)]
    pub layout: Option<SampleLayout>,
    #[serde(default = "default_samples_per_pixel")]
    pub samples_per_pixel: usize,
    pub levels: Vec<MemoryLevel>,
    #[serde(default)]
    pub geo_keys: Option<GeoKeys>,
    #[serde(default)]
    pub geo_transform: Option<GeoTransform>,
}

fn default_samples_per_pixel() -> usize {
    1
}

impl MemoryRaster {
    /// Single-level raster.
    pub fn new(id: impl Into<String>, width: usize, height: usize, samples: SampleBuffer) -> Self {
        Self {
            id: id.into(),
            layout: None,
            samples_per_pixel: 1,
            levels: vec![MemoryLevel { width, height, samples }],
            geo_keys: None,
            geo_transform: None,
        }
    }

    /// Pixel-interleaved raster with `samples_per_pixel` samples per pixel.
    pub fn interleaved(
        id: impl Into<String>,
        width: usize,
        height: usize,
        samples_per_pixel: usize,
        samples: SampleBuffer,
    ) -> Self {
        Self {
            samples_per_pixel,
            ..Self::new(id, width, height, samples)
        }
    }

    /// Append an overview level.
    pub fn with_overview(mut self, width: usize, height: usize, samples: SampleBuffer) -> Self {
        self.levels.push(MemoryLevel { width, height, samples });
        self
    }

    pub fn with_geo(mut self, geo_keys: GeoKeys, geo_transform: GeoTransform) -> Self {
        self.geo_keys = Some(geo_keys);
        self.geo_transform = Some(geo_transform);
        self
    }

    pub fn with_layout(mut self, layout: SampleLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let raster: MemoryRaster =
            serde_json::from_str(json).map_err(|e| SourceError::Invalid(format!("raster fixture: {}", e)))?;
        raster.validate()?;
        Ok(raster)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceError::NotFound(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Check that every level holds `width * height * spp` samples of one format.
    pub fn validate(&self) -> Result<(), SourceError> {
        let Some(first) = self.levels.first() else {
            return Err(SourceError::Invalid(format!("raster '{}' has no levels", self.id)));
        };

        for (i, level) in self.levels.iter().enumerate() {
            let expected = level.width * level.height * self.samples_per_pixel;
            if level.samples.len() != expected {
                return Err(SourceError::Invalid(format!(
                    "raster '{}' level {} holds {} samples, expected {}",
                    self.id,
                    i,
                    level.samples.len(),
                    expected
                )));
            }
            if level.samples.format() != first.samples.format() {
                return Err(SourceError::Invalid(format!(
                    "raster '{}' level {} is {}, level 0 is {}",
                    self.id,
                    i,
                    level.samples.format(),
                    first.samples.format()
                )));
            }
        }

        Ok(())
    }
}

fn crop<T: Copy>(src: &[T], image_width: usize, spp: usize, window: &TileWindow) -> Vec<T> {
    let row_len = window.width * spp;
    let mut out = Vec::with_capacity(window.pixel_count() * spp);
    for row in window.y..window.y + window.height {
        let start = (row * image_width + window.x) * spp;
        out.extend_from_slice(&src[start..start + row_len]);
    }
    out
}

#[async_trait]
impl RasterSource for MemoryRaster {
    fn id(&self) -> &str {
        &self.id
    }

    fn image_count(&self) -> usize {
        self.levels.len()
    }

    fn dimensions(&self, level: usize) -> Option<(usize, usize)> {
        self.levels.get(level).map(|l| (l.width, l.height))
    }

    fn sample_layout(&self) -> SampleLayout {
        self.layout.unwrap_or_else(|| {
            let format = self
                .levels
                .first()
                .map(|l| l.samples.format())
                .unwrap_or(raster_common::SampleFormat::Uint8);
            SampleLayout::of(format, self.samples_per_pixel)
        })
    }

    fn geo_keys(&self) -> Option<GeoKeys> {
        self.geo_keys.clone()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    async fn read_rasters(&self, level: usize, window: TileWindow) -> Result<SampleBuffer, SourceError> {
        let img = self
            .levels
            .get(level)
            .ok_or_else(|| SourceError::Invalid(format!("raster '{}' has no level {}", self.id, level)))?;

        if !window.fits_within(img.width, img.height) {
            return Err(SourceError::Invalid(format!(
                "window {} outside {}x{} image",
                window, img.width, img.height
            )));
        }

        if img.samples.len() != img.width * img.height * self.samples_per_pixel {
            return Err(SourceError::Invalid(format!(
                "raster '{}' level {} sample count does not match its size",
                self.id, level
            )));
        }

        let spp = self.samples_per_pixel;
        Ok(match &img.samples {
            SampleBuffer::Uint8(v) => SampleBuffer::Uint8(crop(v, img.width, spp, &window)),
            SampleBuffer::Int16(v) => SampleBuffer::Int16(crop(v, img.width, spp, &window)),
            SampleBuffer::Uint16(v) => SampleBuffer::Uint16(crop(v, img.width, spp, &window)),
            SampleBuffer::Float32(v) => SampleBuffer::Float32(crop(v, img.width, spp, &window)),
            SampleBuffer::Float64(v) => SampleBuffer::Float64(crop(v, img.width, spp, &window)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crop_window() {
        let raster = MemoryRaster::new("r", 4, 3, SampleBuffer::Uint16((0..12).collect()));
        let samples = raster.read_rasters(0, TileWindow::new(1, 1, 2, 2)).await.unwrap();
        assert_eq!(samples, SampleBuffer::Uint16(vec![5, 6, 9, 10]));
    }

    #[tokio::test]
    async fn test_crop_interleaved() {
        let samples: Vec<u8> = (0..12).collect();
        let raster = MemoryRaster::interleaved("rgb", 2, 2, 3, SampleBuffer::Uint8(samples));
        let out = raster.read_rasters(0, TileWindow::new(1, 0, 1, 2)).await.unwrap();
        assert_eq!(out, SampleBuffer::Uint8(vec![3, 4, 5, 9, 10, 11]));
    }

    #[tokio::test]
    async fn test_window_outside() {
        let raster = MemoryRaster::new("r", 2, 2, SampleBuffer::Uint8(vec![0; 4]));
        assert!(raster.read_rasters(0, TileWindow::new(1, 1, 2, 2)).await.is_err());
        assert!(raster.read_rasters(3, TileWindow::new(0, 0, 1, 1)).await.is_err());
    }

    #[test]
    fn test_validate() {
        let bad = MemoryRaster::new("bad", 2, 2, SampleBuffer::Uint8(vec![0; 3]));
        assert!(bad.validate().is_err());

        let mixed = MemoryRaster::new("mixed", 2, 2, SampleBuffer::Uint8(vec![0; 4]))
            .with_overview(1, 1, SampleBuffer::Uint16(vec![0]));
        assert!(mixed.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let raster = MemoryRaster::from_json_str(
            r#"{
                "id": "B04",
                "levels": [
                    {"width": 2, "height": 1, "samples": {"format": "uint16", "values": [0, 5000]}}
                ],
                "geo_keys": {"model_type": "projected", "projected_type": 32633},
                "geo_transform": {"origin_x": 300000.0, "origin_y": 5000000.0, "pixel_width": 10.0, "pixel_height": -10.0}
            }"#,
        )
        .unwrap();

        assert_eq!(raster.dimensions(0), Some((2, 1)));
        assert_eq!(raster.sample_layout(), SampleLayout::of(raster_common::SampleFormat::Uint16, 1));
        assert_eq!(raster.geo_keys().unwrap().projected_type, Some(32633));
    }
}
