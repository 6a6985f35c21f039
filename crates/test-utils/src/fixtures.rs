//! Catalog and configuration fixtures.
//!
//! The Sentinel-2 item follows the shape of Earth Search L2A items:
//! per-band COGs with `eo:bands` and `raster:bands`, a 3-band true-color
//! `visual` asset, and auxiliary metadata and thumbnail assets.

use std::io::Write;

use tempfile::NamedTempFile;

/// Keys of the Sentinel-2 fixture's raster assets in resolved order.
pub const SENTINEL2_RASTER_ORDER: [&str; 7] = ["blue", "green", "red", "nir", "scl", "visual", "aot"];

/// A Sentinel-2 L2A item.
///
/// Assets are deliberately out of spectral order and include one entry
/// whose `href` is not a string.
pub const SENTINEL2_ITEM: &str = r#"{
  "type": "Feature",
  "stac_version": "1.0.0",
  "id": "S2B_33UUP_20240612_0_L2A",
  "collection": "sentinel-2-l2a",
  "bbox": [12.0, 52.2, 13.6, 53.2],
  "properties": {
    "datetime": "2024-06-12T10:16:05.024000Z",
    "platform": "sentinel-2b",
    "eo:cloud_cover": 3.4
  },
  "assets": {
    "thumbnail": {
      "href": "https://example.com/S2B_33UUP/thumbnail.jpg",
      "type": "image/jpeg",
      "title": "Thumbnail image",
      "roles": ["thumbnail"]
    },
    "granule_metadata": {
      "href": "https://example.com/S2B_33UUP/metadata.xml",
      "type": "application/xml",
      "roles": ["metadata"]
    },
    "scl": {
      "href": "https://example.com/S2B_33UUP/SCL.tif",
      "type": "image/tiff; application=geotiff; profile=cloud-optimized",
      "title": "Scene classification map (SCL)",
      "roles": ["data"],
      "raster:bands": [{"nodata": 0, "data_type": "uint8", "spatial_resolution": 20}]
    },
    "red": {
      "href": "https://example.com/S2B_33UUP/B04.tif",
      "type": "image/tiff; application=geotiff; profile=cloud-optimized",
      "title": "Red (band 4) - 10m",
      "roles": ["data", "reflectance"],
      "eo:bands": [{"name": "B04", "common_name": "red", "center_wavelength": 0.665, "full_width_half_max": 0.038}],
      "raster:bands": [{"nodata": 0, "data_type": "uint16", "scale": 0.0001, "offset": -0.1}]
    },
    "visual": {
      "href": "https://example.com/S2B_33UUP/TCI.tif",
      "type": "image/tiff; application=geotiff; profile=cloud-optimized",
      "title": "True color image",
      "roles": ["visual"],
      "eo:bands": [
        {"name": "B04", "common_name": "red", "center_wavelength": 0.665},
        {"name": "B03", "common_name": "green", "center_wavelength": 0.56},
        {"name": "B02", "common_name": "blue", "center_wavelength": 0.49}
      ],
      "raster:bands": [
        {"nodata": 0, "data_type": "uint8"},
        {"nodata": 0, "data_type": "uint8"},
        {"nodata": 0, "data_type": "uint8"}
      ]
    },
    "blue": {
      "href": "https://example.com/S2B_33UUP/B02.tif",
      "type": "image/tiff; application=geotiff; profile=cloud-optimized",
      "title": "Blue (band 2) - 10m",
      "roles": ["data", "reflectance"],
      "eo:bands": [{"name": "B02", "common_name": "blue", "center_wavelength": 0.49}],
      "raster:bands": [{"nodata": 0, "data_type": "uint16", "scale": 0.0001, "offset": -0.1}]
    },
    "aot": {
      "href": "https://example.com/S2B_33UUP/AOT.TIF?X-Amz-Signature=abc123",
      "title": "Aerosol optical thickness (AOT)",
      "roles": ["data"]
    },
    "broken": {
      "href": 42,
      "type": "image/tiff"
    },
    "green": {
      "href": "https://example.com/S2B_33UUP/B03.tif",
      "type": "image/tiff; application=geotiff; profile=cloud-optimized",
      "title": "Green (band 3) - 10m",
      "roles": ["data", "reflectance"],
      "eo:bands": [{"name": "B03", "common_name": "green", "center_wavelength": 0.56}],
      "raster:bands": [{"nodata": 0, "data_type": "uint16", "scale": 0.0001, "offset": -0.1}]
    },
    "nir": {
      "href": "https://example.com/S2B_33UUP/B08.tif",
      "type": "image/tiff; application=geotiff; profile=cloud-optimized",
      "title": "NIR 1 (band 8) - 10m",
      "roles": ["data", "reflectance"],
      "eo:bands": [{"name": "B08", "common_name": "nir", "center_wavelength": 0.842}],
      "raster:bands": [{"nodata": 0, "data_type": "uint16", "scale": 0.0001, "offset": -0.1}]
    },
    "tileinfo_metadata": {
      "href": "https://example.com/S2B_33UUP/tileInfo.json",
      "type": "application/json",
      "roles": ["metadata"]
    }
  },
  "links": []
}"#;

/// A STAC 1.1 item using the unified `bands` array.
pub const STAC_1_1_ITEM: &str = r#"{
  "type": "Feature",
  "stac_version": "1.1.0",
  "id": "dem-tile-n45e007",
  "properties": {"datetime": null},
  "assets": {
    "elevation": {
      "href": "s3://dem/n45e007.tif",
      "type": "image/tiff; application=geotiff",
      "bands": [{"name": "elevation", "data_type": "float32", "nodata": "nan", "raster:scale": 1.0, "raster:offset": 0.0}]
    },
    "swir": {
      "href": "s3://dem/swir.tif",
      "type": "image/tiff; application=geotiff",
      "bands": [{"name": "B11", "eo:common_name": "swir16", "eo:center_wavelength": 1.61, "data_type": "int16", "nodata": -9999}]
    }
  }
}"#;

/// Single-band layer with a colormap, as YAML.
pub const SINGLE_LAYER_YAML: &str = r#"
selection:
  mode: single
  asset: red
  colormap: gray
  rescale: { min: 0, max: 10000 }
opacity: 1.0
"#;

/// RGB layer over the Sentinel-2 10m bands, as YAML.
pub const RGB_LAYER_YAML: &str = r#"
selection:
  mode: rgb
  assets: [red, green, blue]
  rescale: { min: 0, max: 3000 }
"#;

/// Write `contents` to a temporary file whose name ends with `suffix`.
pub fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_temp_suffix() {
        let file = write_temp("{}", ".json");
        assert!(file.path().to_string_lossy().ends_with(".json"));
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "{}");
    }
}
