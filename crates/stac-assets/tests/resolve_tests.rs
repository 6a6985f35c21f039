//! Asset resolution against catalog fixtures.

use raster_common::{BandSelection, RasterError, RescaleRange, SampleFormat};
use stac_assets::{default_selection, resolve_assets, StacError, StacItem};
use test_utils::{write_temp, SENTINEL2_ITEM, SENTINEL2_RASTER_ORDER, STAC_1_1_ITEM};

// ============================================================================
// Sentinel-2 item
// ============================================================================

#[test]
fn test_sentinel2_order() {
    let item = StacItem::from_json_str(SENTINEL2_ITEM).unwrap();
    let keys: Vec<String> = resolve_assets(&item, false)
        .unwrap()
        .into_iter()
        .map(|a| a.key)
        .collect();
    assert_eq!(keys, SENTINEL2_RASTER_ORDER);
}

#[test]
fn test_sentinel2_skips_malformed_asset() {
    let item = StacItem::from_json_str(SENTINEL2_ITEM).unwrap();
    assert!(item.asset("broken").is_none());
    assert!(item.asset("thumbnail").is_some());
}

#[test]
fn test_sentinel2_band_metadata() {
    let item = StacItem::from_json_str(SENTINEL2_ITEM).unwrap();
    let assets = resolve_assets(&item, false).unwrap();

    let red = assets.iter().find(|a| a.key == "red").unwrap();
    assert_eq!(red.sample_format, Some(SampleFormat::Uint16));
    assert_eq!(red.nodata, Some(0.0));
    assert_eq!(red.scale, Some(0.0001));
    assert_eq!(red.offset, Some(-0.1));
    assert_eq!(red.center_wavelength, Some(0.665));
    assert_eq!(red.common_name.as_deref(), Some("red"));

    let visual = assets.iter().find(|a| a.key == "visual").unwrap();
    assert_eq!(visual.samples_per_pixel, 3);
    assert!(visual.is_native_rgb());

    let aot = assets.iter().find(|a| a.key == "aot").unwrap();
    assert_eq!(aot.sample_format, None);
    assert_eq!(aot.nodata, None);
}

#[test]
fn test_sentinel2_with_thumbnails() {
    let item = StacItem::from_json_str(SENTINEL2_ITEM).unwrap();
    let keys: Vec<String> = resolve_assets(&item, true)
        .unwrap()
        .into_iter()
        .map(|a| a.key)
        .collect();
    assert_eq!(
        keys,
        vec!["blue", "green", "red", "nir", "thumbnail", "scl", "visual", "aot"]
    );
}

#[test]
fn test_sentinel2_default_rgb() {
    let item = StacItem::from_json_str(SENTINEL2_ITEM).unwrap();
    let assets = resolve_assets(&item, false).unwrap();
    let selection = default_selection(&assets).unwrap();
    assert_eq!(
        selection,
        BandSelection::rgb("red", "green", "blue", RescaleRange::for_format(SampleFormat::Uint16))
    );
}

// ============================================================================
// STAC 1.1 bands
// ============================================================================

#[test]
fn test_unified_bands() {
    let item = StacItem::from_json_str(STAC_1_1_ITEM).unwrap();
    let assets = resolve_assets(&item, false).unwrap();

    // swir has a wavelength, elevation does not.
    assert_eq!(assets[0].key, "swir");
    assert_eq!(assets[0].center_wavelength, Some(1.61));
    assert_eq!(assets[0].common_name.as_deref(), Some("swir16"));
    assert_eq!(assets[0].nodata, Some(-9999.0));
    assert_eq!(assets[0].sample_format, Some(SampleFormat::Int16));

    let elevation = &assets[1];
    assert_eq!(elevation.sample_format, Some(SampleFormat::Float32));
    assert!(elevation.nodata.unwrap().is_nan());
    assert_eq!(elevation.scale, Some(1.0));
    assert!(item.datetime.is_none());
}

#[test]
fn test_unified_default_is_gray_first_asset() {
    let item = StacItem::from_json_str(STAC_1_1_ITEM).unwrap();
    let assets = resolve_assets(&item, false).unwrap();
    let selection = default_selection(&assets).unwrap();
    assert_eq!(selection.asset_keys(), vec!["swir"]);
    assert_eq!(selection.rescale(), Some(RescaleRange::for_format(SampleFormat::Int16)));
}

// ============================================================================
// Files and errors
// ============================================================================

#[test]
fn test_item_from_file() {
    let file = write_temp(SENTINEL2_ITEM, ".json");
    let item = StacItem::from_file(file.path()).unwrap();
    assert_eq!(item.id, "S2B_33UUP_20240612_0_L2A");
    assert_eq!(item.bbox, Some([12.0, 52.2, 13.6, 53.2]));
}

#[test]
fn test_invalid_json_is_asset_resolution_error() {
    let err = StacItem::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, StacError::Parse(_)));
    let err: RasterError = err.into();
    assert!(matches!(err, RasterError::AssetResolution(_)));
}
