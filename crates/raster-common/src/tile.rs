//! Tile windows, decoded sample tiles and rendered RGBA tiles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sample::{SampleBuffer, SampleFormat};

/// Pixel-space request against one resolution level of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileWindow {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl TileWindow {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Whether the window lies entirely inside an image of the given size.
    pub fn fits_within(&self, image_width: usize, image_height: usize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|right| right <= image_width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= image_height)
    }

    /// Parse "x,y,width,height".
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<usize> = s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            [x, y, w, h] => Some(Self::new(*x, *y, *w, *h)),
            _ => None,
        }
    }
}

impl fmt::Display for TileWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Samples read for one window, pixel-interleaved, native type preserved.
///
/// Ephemeral: owned by the pipeline for the duration of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTile {
    pub samples: SampleBuffer,
    pub samples_per_pixel: usize,
    pub width: usize,
    pub height: usize,
}

impl DecodedTile {
    pub fn new(samples: SampleBuffer, samples_per_pixel: usize, width: usize, height: usize) -> Self {
        Self {
            samples,
            samples_per_pixel,
            width,
            height,
        }
    }

    /// Single-band tile.
    pub fn single(samples: SampleBuffer, width: usize, height: usize) -> Self {
        Self::new(samples, 1, width, height)
    }

    pub fn format(&self) -> SampleFormat {
        self.samples.format()
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn same_geometry(&self, other: &DecodedTile) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Texture-ready RGBA output for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTile {
    /// `width * height * 4` bytes, row-major RGBA.
    pub rgba: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Final color already produced; later stages must not rescale or
    /// colormap again.
    pub pre_normalized: bool,
}

impl RenderedTile {
    /// Fully transparent tile.
    pub fn transparent(width: usize, height: usize, pre_normalized: bool) -> Self {
        Self {
            rgba: vec![0u8; width * height * 4],
            width,
            height,
            pre_normalized,
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        Some([self.rgba[idx], self.rgba[idx + 1], self.rgba[idx + 2], self.rgba[idx + 3]])
    }

    pub fn alphas(&self) -> Vec<u8> {
        self.rgba.chunks_exact(4).map(|px| px[3]).collect()
    }
}

/// Affine pixel-to-model transform of the full-resolution image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Usually negative (north-up imagery).
    pub pixel_height: f64,
}

impl GeoTransform {
    pub const fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build from GeoTIFF ModelTiepoint (I,J,K,X,Y,Z) and ModelPixelScale (Sx,Sy,Sz).
    pub fn from_tiepoint(tiepoint: &[f64], pixel_scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || pixel_scale.len() < 2 {
            return None;
        }
        let origin_x = tiepoint[3] - tiepoint[0] * pixel_scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * pixel_scale[1];
        Some(Self::new(origin_x, origin_y, pixel_scale[0], -pixel_scale[1]))
    }

    pub fn pixel_to_model(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Transform for an overview whose pixels are `factor_x`/`factor_y`
    /// times coarser than the full-resolution image.
    pub fn scaled(&self, factor_x: f64, factor_y: f64) -> Self {
        Self::new(
            self.origin_x,
            self.origin_y,
            self.pixel_width * factor_x,
            self.pixel_height * factor_y,
        )
    }
}

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LonLatBounds {
    /// Smallest box enclosing all points.
    pub fn enclosing(points: &[(f64, f64)]) -> Option<Self> {
        let mut finite = points.iter().filter(|(lon, lat)| lon.is_finite() && lat.is_finite());
        let &(lon0, lat0) = finite.next()?;
        let init = Self {
            west: lon0,
            south: lat0,
            east: lon0,
            north: lat0,
        };
        Some(finite.fold(init, |acc, &(lon, lat)| Self {
            west: acc.west.min(lon),
            south: acc.south.min(lat),
            east: acc.east.max(lon),
            north: acc.north.max(lat),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_fits() {
        let w = TileWindow::new(256, 0, 256, 256);
        assert!(w.fits_within(512, 256));
        assert!(!w.fits_within(511, 256));
        assert!(!TileWindow::new(0, 0, 0, 10).fits_within(100, 100));
        assert!(!TileWindow::new(usize::MAX, 0, 2, 2).fits_within(100, 100));
    }

    #[test]
    fn test_window_parse() {
        assert_eq!(TileWindow::parse("0, 256,256,128"), Some(TileWindow::new(0, 256, 256, 128)));
        assert_eq!(TileWindow::parse("1,2,3"), None);
        assert_eq!(TileWindow::parse("a,b,c,d"), None);
    }

    #[test]
    fn test_geotransform_from_tiepoint() {
        let gt = GeoTransform::from_tiepoint(&[0.0, 0.0, 0.0, 300000.0, 5000040.0, 0.0], &[10.0, 10.0, 0.0]).unwrap();
        assert_eq!(gt.pixel_to_model(0.0, 0.0), (300000.0, 5000040.0));
        assert_eq!(gt.pixel_to_model(10.0, 4.0), (300100.0, 5000000.0));
        let overview = gt.scaled(2.0, 2.0);
        assert_eq!(overview.pixel_to_model(5.0, 2.0), (300100.0, 5000000.0));
    }

    #[test]
    fn test_bounds_enclosing_skips_non_finite() {
        let b = LonLatBounds::enclosing(&[(f64::NAN, 1.0), (10.0, 40.0), (12.0, 38.0)]).unwrap();
        assert_eq!(b.west, 10.0);
        assert_eq!(b.east, 12.0);
        assert_eq!(b.south, 38.0);
        assert_eq!(b.north, 40.0);
        assert!(LonLatBounds::enclosing(&[]).is_none());
    }
}
