//! Synthetic rasters with predictable sample patterns.

use projection::GeoKeys;
use raster_common::{GeoTransform, SampleBuffer};
use tile_decoder::MemoryRaster;

/// Creates uint16 samples where each value is `col * 100 + row`.
///
/// Makes it easy to verify that a window was cropped from the right
/// place: `samples[row * width + col] == col * 100 + row`.
pub fn create_test_samples(width: usize, height: usize) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 100 + row) as u16);
        }
    }
    data
}

/// Single-level uint16 raster filled with [`create_test_samples`].
pub fn gradient_raster(id: &str, width: usize, height: usize) -> MemoryRaster {
    MemoryRaster::new(id, width, height, SampleBuffer::Uint16(create_test_samples(width, height)))
}

/// uint16 raster with one overview per entry of `sizes` (square levels).
pub fn pyramid_raster(id: &str, sizes: &[usize]) -> MemoryRaster {
    let (first, rest) = sizes.split_first().expect("at least one level");
    let mut raster = gradient_raster(id, *first, *first);
    for &size in rest {
        raster = raster.with_overview(size, size, SampleBuffer::Uint16(create_test_samples(size, size)));
    }
    raster
}

/// The 2x2 uint16 tile `[[0, 5000], [10000, 0]]`.
pub fn gray_scenario_raster(id: &str) -> MemoryRaster {
    MemoryRaster::new(id, 2, 2, SampleBuffer::Uint16(vec![0, 5000, 10000, 0]))
}

/// Red, green and blue 2x1 bands: an all-zero pixel, then a red-only pixel.
pub fn rgb_scenario_rasters() -> [MemoryRaster; 3] {
    [
        MemoryRaster::new("red", 2, 1, SampleBuffer::Uint16(vec![0, 50])),
        MemoryRaster::new("green", 2, 1, SampleBuffer::Uint16(vec![0, 0])),
        MemoryRaster::new("blue", 2, 1, SampleBuffer::Uint16(vec![0, 0])),
    ]
}

/// Pixel-interleaved uint8 true-color raster; pixel 0 is black.
pub fn visual_raster(id: &str, width: usize, height: usize) -> MemoryRaster {
    let mut samples = Vec::with_capacity(width * height * 3);
    for i in 0..width * height {
        let v = (i % 255) as u8;
        samples.extend_from_slice(&[v, v / 2, 255 - v]);
    }
    samples[0..3].copy_from_slice(&[0, 0, 0]);
    MemoryRaster::interleaved(id, width, height, 3, SampleBuffer::Uint8(samples))
}

/// Geotransform of a 10m grid in UTM zone 33N whose origin sits on the
/// central meridian (15E) at the equator.
pub const UTM33_TRANSFORM: GeoTransform = GeoTransform::new(500000.0, 0.0, 10.0, -10.0);

/// Attach UTM 33N geo keys and [`UTM33_TRANSFORM`].
pub fn in_utm33(raster: MemoryRaster) -> MemoryRaster {
    raster.with_geo(GeoKeys::projected(32633), UTM33_TRANSFORM)
}
