//! Raster asset filtering, band metadata extraction and ordering.

use std::cmp::Ordering;

use raster_common::{BandSelection, ColormapChoice, RasterAsset, RescaleRange, SampleFormat};
use tracing::{debug, info, instrument};

use crate::error::{Result, StacError};
use crate::item::{StacAsset, StacItem};

const AUXILIARY_ROLES: &[&str] = &["metadata"];
const PREVIEW_ROLES: &[&str] = &["thumbnail", "overview"];
const RASTER_EXTENSIONS: &[&str] = &[".tif", ".tiff"];
const AUXILIARY_MEDIA: &[&str] = &["xml", "json", "html", "text/"];
const PREVIEW_MEDIA: &[&str] = &["image/png", "image/jpeg", "image/jpg", "image/webp"];

/// Whether `asset` is a raster the pipeline can display.
///
/// Metadata sidecars are never rasters. Thumbnail and overview previews
/// only count when `include_thumbnails` is set, in which case their
/// plain image types are accepted too.
pub fn is_raster_asset(asset: &StacAsset, include_thumbnails: bool) -> bool {
    if AUXILIARY_ROLES.iter().any(|r| asset.has_role(r)) {
        return false;
    }

    let is_preview = PREVIEW_ROLES.iter().any(|r| asset.has_role(r));
    if is_preview && !include_thumbnails {
        return false;
    }

    match asset.media_type.as_deref().map(str::to_ascii_lowercase) {
        Some(media) if media.contains("tiff") => true,
        Some(media) if is_preview && PREVIEW_MEDIA.iter().any(|m| media.starts_with(m)) => true,
        Some(media) if AUXILIARY_MEDIA.iter().any(|m| media.contains(m)) => false,
        Some(media) if media.starts_with("image/") => false,
        _ => has_raster_extension(&asset.href),
    }
}

/// `.tif`/`.tiff` path, ignoring case, query string and fragment.
fn has_raster_extension(href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or(href).to_ascii_lowercase();
    RASTER_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Band metadata of one catalog asset.
///
/// Per-band values come from the first band, preferring STAC 1.1 `bands`
/// over `raster:bands` and `eo:bands`. Wavelength and common name are
/// only meaningful for single-band assets.
pub fn raster_asset(key: &str, asset: &StacAsset) -> RasterAsset {
    let unified = asset.bands.first();
    let raster = asset.raster_bands.first();
    let eo = asset.eo_bands.first();
    let samples_per_pixel = asset.band_count();

    let data_type = unified
        .and_then(|b| b.data_type.as_deref())
        .or_else(|| raster.and_then(|b| b.data_type.as_deref()));

    let (center_wavelength, common_name) = if samples_per_pixel == 1 {
        (
            unified
                .and_then(|b| b.center_wavelength)
                .or_else(|| eo.and_then(|b| b.center_wavelength)),
            unified
                .and_then(|b| b.common_name.clone())
                .or_else(|| eo.and_then(|b| b.common_name.clone())),
        )
    } else {
        (None, None)
    };

    RasterAsset {
        key: key.to_string(),
        href: asset.href.clone(),
        title: asset.title.clone(),
        media_type: asset.media_type.clone(),
        sample_format: data_type.and_then(SampleFormat::from_data_type),
        samples_per_pixel,
        nodata: unified.and_then(|b| b.nodata).or_else(|| raster.and_then(|b| b.nodata)),
        scale: unified.and_then(|b| b.scale).or_else(|| raster.and_then(|b| b.scale)),
        offset: unified.and_then(|b| b.offset).or_else(|| raster.and_then(|b| b.offset)),
        center_wavelength,
        common_name,
    }
}

/// Wavelength-bearing assets first, ascending; the rest keep catalog order.
fn spectral_order(a: &RasterAsset, b: &RasterAsset) -> Ordering {
    match (a.center_wavelength, b.center_wavelength) {
        (Some(wa), Some(wb)) => wa.total_cmp(&wb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Raster assets of `item` in display order.
///
/// The order is a default-selection aid (plausible R/G/B picks), not an
/// authoritative band ordering.
#[instrument(skip(item), fields(item = %item.id))]
pub fn resolve_assets(item: &StacItem, include_thumbnails: bool) -> Result<Vec<RasterAsset>> {
    let mut assets: Vec<RasterAsset> = item
        .assets
        .iter()
        .filter(|(key, asset)| {
            let keep = is_raster_asset(asset, include_thumbnails);
            if !keep {
                debug!(asset = %key, media_type = ?asset.media_type, "Skipping non-raster asset");
            }
            keep
        })
        .map(|(key, asset)| raster_asset(key, asset))
        .collect();

    if assets.is_empty() {
        return Err(StacError::NoRasterAssets(item.id.clone()));
    }

    // Stable: equal keys keep catalog order.
    assets.sort_by(spectral_order);

    info!(count = assets.len(), "Resolved raster assets");
    Ok(assets)
}

fn find_band<'a>(assets: &'a [RasterAsset], name: &str) -> Option<&'a RasterAsset> {
    assets
        .iter()
        .find(|a| a.samples_per_pixel == 1 && a.common_name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .or_else(|| {
            assets
                .iter()
                .find(|a| a.samples_per_pixel == 1 && a.key.eq_ignore_ascii_case(name))
        })
}

/// A plausible initial band selection for resolved `assets`.
///
/// 1. Single-band `red`, `green` and `blue` assets form an RGB composite.
/// 2. Otherwise a pre-packed 8-bit true-color asset is shown as is.
/// 3. Otherwise the first asset is shown in gray, rescaled over its
///    data type's natural range.
pub fn default_selection(assets: &[RasterAsset]) -> Result<BandSelection> {
    let Some(first) = assets.first() else {
        return Err(StacError::NoRasterAssets(String::new()));
    };

    if let (Some(r), Some(g), Some(b)) = (
        find_band(assets, "red"),
        find_band(assets, "green"),
        find_band(assets, "blue"),
    ) {
        let format = r.sample_format.unwrap_or(SampleFormat::Uint8);
        return Ok(BandSelection::rgb(
            r.key.clone(),
            g.key.clone(),
            b.key.clone(),
            RescaleRange::for_format(format),
        ));
    }

    if let Some(visual) = assets.iter().find(|a| a.is_native_rgb()) {
        return Ok(BandSelection::single(
            visual.key.clone(),
            ColormapChoice::None,
            RescaleRange::for_format(SampleFormat::Uint8),
        ));
    }

    let format = first.sample_format.unwrap_or(SampleFormat::Uint8);
    Ok(BandSelection::single(
        first.key.clone(),
        ColormapChoice::Named("gray".to_string()),
        RescaleRange::for_format(format),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset(value: serde_json::Value) -> StacAsset {
        serde_json::from_value(value).unwrap()
    }

    fn item(assets: serde_json::Value) -> StacItem {
        StacItem::from_value(&json!({"id": "test", "assets": assets})).unwrap()
    }

    #[test]
    fn test_media_type_filter() {
        assert!(is_raster_asset(&asset(json!({"href": "x", "type": "image/tiff; application=geotiff"})), false));
        assert!(is_raster_asset(&asset(json!({"href": "x", "type": "image/vnd.stac.geotiff"})), false));
        assert!(!is_raster_asset(&asset(json!({"href": "x.tif", "type": "application/xml"})), false));
        assert!(!is_raster_asset(&asset(json!({"href": "x.tif", "type": "image/jp2"})), false));
        assert!(is_raster_asset(&asset(json!({"href": "s3://b/x.TIF?sig=1"})), false));
        assert!(!is_raster_asset(&asset(json!({"href": "s3://b/x.json"})), false));
    }

    #[test]
    fn test_roles_filter() {
        let meta = asset(json!({"href": "x.tif", "type": "image/tiff", "roles": ["metadata"]}));
        assert!(!is_raster_asset(&meta, true));

        let thumb = asset(json!({"href": "t.png", "type": "image/png", "roles": ["thumbnail"]}));
        assert!(!is_raster_asset(&thumb, false));
        assert!(is_raster_asset(&thumb, true));

        // Preview image types do not pass without a preview role.
        let png = asset(json!({"href": "t.png", "type": "image/png", "roles": ["data"]}));
        assert!(!is_raster_asset(&png, true));
    }

    #[test]
    fn test_wavelength_ordering() {
        let item = item(json!({
            "b": {"href": "b.tif", "eo:bands": [{"center_wavelength": 0.49}]},
            "r": {"href": "r.tif", "eo:bands": [{"center_wavelength": 0.66}]},
            "x": {"href": "x.tif"},
            "g": {"href": "g.tif", "eo:bands": [{"center_wavelength": 0.56}]}
        }));

        let resolved = resolve_assets(&item, false).unwrap();
        let wavelengths: Vec<Option<f64>> = resolved.iter().map(|a| a.center_wavelength).collect();
        assert_eq!(wavelengths, vec![Some(0.49), Some(0.56), Some(0.66), None]);
        assert_eq!(resolved[3].key, "x");
    }

    #[test]
    fn test_unordered_assets_keep_catalog_order() {
        let item = item(json!({
            "z": {"href": "z.tif"},
            "a": {"href": "a.tif"},
            "m": {"href": "m.tif"}
        }));
        let keys: Vec<String> = resolve_assets(&item, false).unwrap().into_iter().map(|a| a.key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_no_raster_assets() {
        let item = item(json!({"meta": {"href": "m.xml", "type": "application/xml"}}));
        let err = resolve_assets(&item, false).unwrap_err();
        assert!(matches!(err, StacError::NoRasterAssets(_)));
        let err: raster_common::RasterError = err.into();
        assert!(err.is_fatal_for_layer());
    }

    #[test]
    fn test_multi_band_asset_has_no_wavelength() {
        let visual = asset(json!({
            "href": "tci.tif",
            "eo:bands": [
                {"common_name": "red", "center_wavelength": 0.665},
                {"common_name": "green", "center_wavelength": 0.56},
                {"common_name": "blue", "center_wavelength": 0.49}
            ],
            "raster:bands": [{"data_type": "uint8"}, {"data_type": "uint8"}, {"data_type": "uint8"}]
        }));
        let resolved = raster_asset("visual", &visual);
        assert_eq!(resolved.samples_per_pixel, 3);
        assert_eq!(resolved.center_wavelength, None);
        assert!(resolved.is_native_rgb());
    }

    #[test]
    fn test_default_selection_fallbacks() {
        let mut gray = RasterAsset::new("dem", "dem.tif");
        gray.sample_format = Some(SampleFormat::Int16);
        let selection = default_selection(&[gray.clone()]).unwrap();
        assert_eq!(
            selection,
            BandSelection::single("dem", ColormapChoice::Named("gray".into()), RescaleRange::for_format(SampleFormat::Int16))
        );

        let mut visual = RasterAsset::new("visual", "tci.tif");
        visual.samples_per_pixel = 3;
        let selection = default_selection(&[gray, visual]).unwrap();
        assert_eq!(selection.asset_keys(), vec!["visual"]);
        assert!(selection.colormap().is_none());

        assert!(default_selection(&[]).is_err());
    }
}
