//! Tolerant STAC item model.
//!
//! Catalog JSON is loosely typed in practice: optional fields go missing,
//! numbers arrive as strings, single assets are malformed. Parsing here
//! never fails on a bad optional field. It yields `None` (or a default
//! band entry) instead, and a malformed asset is skipped with a warning.
//! Everything downstream works with explicit options.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, StacError};

/// A STAC item reduced to what raster display needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StacItem {
    pub id: String,
    pub collection: Option<String>,
    pub datetime: Option<DateTime<Utc>>,
    /// `[west, south, east, north]`
    pub bbox: Option<[f64; 4]>,
    /// Assets in catalog order.
    pub assets: Vec<(String, StacAsset)>,
}

impl StacItem {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let id = value.get("id").and_then(Value::as_str).unwrap_or_default().to_string();

        let Some(raw_assets) = value.get("assets").and_then(Value::as_object) else {
            return Err(StacError::MissingAssets(id));
        };

        let mut assets = Vec::with_capacity(raw_assets.len());
        for (key, raw) in raw_assets {
            match serde_json::from_value::<StacAsset>(raw.clone()) {
                Ok(asset) => assets.push((key.clone(), asset)),
                Err(e) => warn!(item = %id, asset = %key, error = %e, "Skipping malformed asset"),
            }
        }

        let properties = value.get("properties");
        let datetime = properties
            .and_then(|p| p.get("datetime"))
            .and_then(Value::as_str)
            .and_then(|s| match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    debug!(item = %id, datetime = s, error = %e, "Ignoring unparseable datetime");
                    None
                }
            });

        Ok(Self {
            collection: value.get("collection").and_then(Value::as_str).map(str::to_string),
            datetime,
            bbox: value.get("bbox").and_then(parse_bbox),
            assets,
            id,
        })
    }

    pub fn asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }
}

/// 2D bbox, or the horizontal part of a 3D one.
fn parse_bbox(value: &Value) -> Option<[f64; 4]> {
    let nums: Vec<f64> = value.as_array()?.iter().filter_map(Value::as_f64).collect();
    match nums.as_slice() {
        [w, s, e, n] => Some([*w, *s, *e, *n]),
        [w, s, _, e, n, _] => Some([*w, *s, *e, *n]),
        _ => None,
    }
}

/// One entry of an item's asset map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StacAsset {
    pub href: String,

    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub media_type: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub roles: Vec<String>,

    /// Raster extension (`raster:bands`).
    #[serde(rename = "raster:bands", default, deserialize_with = "lenient_vec")]
    pub raster_bands: Vec<RasterBand>,

    /// Electro-optical extension (`eo:bands`).
    #[serde(rename = "eo:bands", default, deserialize_with = "lenient_vec")]
    pub eo_bands: Vec<EoBand>,

    /// STAC 1.1 unified `bands`.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub bands: Vec<Band>,
}

impl StacAsset {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Number of bands declared by any band extension, at least 1.
    pub fn band_count(&self) -> usize {
        self.bands
            .len()
            .max(self.raster_bands.len())
            .max(self.eo_bands.len())
            .max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RasterBand {
    #[serde(default, deserialize_with = "lenient")]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "nodata")]
    pub nodata: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub scale: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EoBand {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub common_name: Option<String>,
    /// Micrometers.
    #[serde(default, deserialize_with = "lenient")]
    pub center_wavelength: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Band {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "nodata")]
    pub nodata: Option<f64>,
    #[serde(rename = "eo:common_name", default, deserialize_with = "lenient")]
    pub common_name: Option<String>,
    #[serde(rename = "eo:center_wavelength", default, deserialize_with = "lenient")]
    pub center_wavelength: Option<f64>,
    #[serde(rename = "raster:scale", default, deserialize_with = "lenient")]
    pub scale: Option<f64>,
    #[serde(rename = "raster:offset", default, deserialize_with = "lenient")]
    pub offset: Option<f64>,
}

/// `None` for a missing or wrongly typed field.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Array elements that fail to parse become defaults, keeping band indices aligned.
fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn nodata<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_nodata))
}

/// Nodata as a number or as a string such as `"nan"` or `"-inf"`.
pub fn parse_nodata(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "nan" => Some(f64::NAN),
            "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
            "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nodata_forms() {
        assert_eq!(parse_nodata(&json!(0)), Some(0.0));
        assert_eq!(parse_nodata(&json!(-9999.5)), Some(-9999.5));
        assert!(parse_nodata(&json!("nan")).unwrap().is_nan());
        assert_eq!(parse_nodata(&json!("-inf")), Some(f64::NEG_INFINITY));
        assert_eq!(parse_nodata(&json!("255")), Some(255.0));
        assert_eq!(parse_nodata(&json!("none")), None);
        assert_eq!(parse_nodata(&json!(null)), None);
    }

    #[test]
    fn test_wrongly_typed_fields_become_none() {
        let asset: StacAsset = serde_json::from_value(json!({
            "href": "b.tif",
            "type": 7,
            "roles": "data",
            "eo:bands": [{"center_wavelength": "blue"}, {"center_wavelength": 0.56}],
            "raster:bands": [42, {"nodata": 0, "data_type": "uint16"}]
        }))
        .unwrap();

        assert_eq!(asset.media_type, None);
        assert!(asset.roles.is_empty());
        assert_eq!(asset.eo_bands[0].center_wavelength, None);
        assert_eq!(asset.eo_bands[1].center_wavelength, Some(0.56));
        // Index 0 kept as a default entry.
        assert_eq!(asset.raster_bands.len(), 2);
        assert_eq!(asset.raster_bands[0], RasterBand::default());
        assert_eq!(asset.band_count(), 2);
    }

    #[test]
    fn test_item_without_assets() {
        let err = StacItem::from_json_str(r#"{"id": "x", "properties": {}}"#).unwrap_err();
        assert!(matches!(err, StacError::MissingAssets(id) if id == "x"));
    }

    #[test]
    fn test_item_metadata() {
        let item = StacItem::from_json_str(
            r#"{
                "id": "S2",
                "collection": "sentinel-2-l2a",
                "bbox": [1.0, 2.0, 0.0, 3.0, 4.0, 100.0],
                "properties": {"datetime": "2024-06-12T10:16:05Z"},
                "assets": {"a": {"href": "a.tif"}, "b": {"href": null}}
            }"#,
        )
        .unwrap();

        assert_eq!(item.collection.as_deref(), Some("sentinel-2-l2a"));
        assert_eq!(item.bbox, Some([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(item.datetime.unwrap().to_rfc3339(), "2024-06-12T10:16:05+00:00");
        assert_eq!(item.assets.len(), 1);
        assert!(item.asset("a").is_some());
    }
}
