//! Decoding windows from raster fixtures on disk.

use std::io::Write;

use raster_common::{RasterError, SampleBuffer, SampleFormat, TileWindow};
use tile_decoder::{decode, level_geo_transform, match_levels, MemoryRaster, RasterSource};

fn write_fixture(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

const PYRAMID: &str = r#"{
    "id": "B08",
    "levels": [
        {"width": 4, "height": 4, "samples": {"format": "uint16", "values": [
            0, 1, 2, 3,
            4, 5, 6, 7,
            8, 9, 10, 11,
            12, 13, 14, 15
        ]}},
        {"width": 2, "height": 2, "samples": {"format": "uint16", "values": [100, 200, 300, 400]}}
    ],
    "geo_keys": {"model_type": "projected", "projected_type": 32633},
    "geo_transform": {"origin_x": 500000.0, "origin_y": 4000.0, "pixel_width": 1000.0, "pixel_height": -1000.0}
}"#;

#[tokio::test]
async fn test_decode_overview_from_file() {
    let file = write_fixture(PYRAMID);
    let raster = MemoryRaster::from_file(file.path()).unwrap();

    assert_eq!(raster.image_count(), 2);
    let tile = decode(&raster, 1, TileWindow::new(0, 1, 2, 1)).await.unwrap();
    assert_eq!(tile.format(), SampleFormat::Uint16);
    assert_eq!((tile.width, tile.height), (2, 1));
    assert_eq!(tile.samples, SampleBuffer::Uint16(vec![300, 400]));
}

#[tokio::test]
async fn test_decode_interior_window() {
    let raster = MemoryRaster::from_json_str(PYRAMID).unwrap();
    let tile = decode(&raster, 0, TileWindow::new(2, 1, 2, 3)).await.unwrap();
    assert_eq!(tile.samples, SampleBuffer::Uint16(vec![6, 7, 10, 11, 14, 15]));
}

#[test]
fn test_overview_geo_transform() {
    let raster = MemoryRaster::from_json_str(PYRAMID).unwrap();
    let gt = level_geo_transform(&raster, 1).unwrap();
    assert_eq!(gt.pixel_width, 2000.0);
    assert_eq!(gt.pixel_height, -2000.0);
    assert_eq!(gt.pixel_to_model(1.0, 1.0), (502000.0, 2000.0));
}

#[test]
fn test_missing_fixture() {
    assert!(MemoryRaster::from_file("/nonexistent/raster.json").is_err());
}

#[test]
fn test_rgb_bands_with_different_pyramids() {
    let red = MemoryRaster::from_json_str(PYRAMID).unwrap();
    // 20m band: no full-resolution match, but its first level matches the
    // red overview.
    let swir = MemoryRaster::new("B11", 2, 2, SampleBuffer::Uint16(vec![1, 2, 3, 4]));

    assert_eq!(match_levels(&red, 1, &[&swir]).unwrap(), vec![0]);
    let err = match_levels(&red, 0, &[&swir]).unwrap_err();
    assert!(matches!(err, RasterError::DimensionMismatch(_)));
}
