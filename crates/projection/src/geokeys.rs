//! GeoKeyDirectory parsing (GeoTIFF tags 34735, 34736, 34737).
//!
//! The directory is a flat array of u16:
//!
//! ```text
//! [version, revision, minor, key_count,
//!  key_id, tag_location, count, value_or_offset,   <- repeated key_count times
//!  ...]
//! ```
//!
//! `tag_location == 0` stores the value inline; 34736 points into the
//! double params, 34737 into the ASCII params.

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

const DOUBLE_PARAMS_TAG: u16 = 34736;
const ASCII_PARAMS_TAG: u16 = 34737;

/// User-defined value in GeoTIFF keys.
pub const USER_DEFINED: u16 = 32767;

/// GeoKeys this resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum GeoKeyId {
    GTModelTypeGeoKey = 1024,
    GTRasterTypeGeoKey = 1025,
    GTCitationGeoKey = 1026,
    GeographicTypeGeoKey = 2048,
    GeogCitationGeoKey = 2049,
    GeogAngularUnitsGeoKey = 2054,
    ProjectedCSTypeGeoKey = 3072,
    PCSCitationGeoKey = 3073,
    ProjLinearUnitsGeoKey = 3076,
}

impl GeoKeyId {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            1024 => Some(GeoKeyId::GTModelTypeGeoKey),
            1025 => Some(GeoKeyId::GTRasterTypeGeoKey),
            1026 => Some(GeoKeyId::GTCitationGeoKey),
            2048 => Some(GeoKeyId::GeographicTypeGeoKey),
            2049 => Some(GeoKeyId::GeogCitationGeoKey),
            2054 => Some(GeoKeyId::GeogAngularUnitsGeoKey),
            3072 => Some(GeoKeyId::ProjectedCSTypeGeoKey),
            3073 => Some(GeoKeyId::PCSCitationGeoKey),
            3076 => Some(GeoKeyId::ProjLinearUnitsGeoKey),
            _ => None,
        }
    }
}

/// GTModelTypeGeoKey values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Projected,
    Geographic,
    Geocentric,
}

impl ModelType {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(ModelType::Projected),
            2 => Some(ModelType::Geographic),
            3 => Some(ModelType::Geocentric),
            _ => None,
        }
    }
}

/// The subset of GeoKeys needed to identify a coordinate system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoKeys {
    #[serde(default)]
    pub model_type: Option<ModelType>,
    #[serde(default)]
    pub raster_type: Option<u16>,
    #[serde(default)]
    pub geographic_type: Option<u16>,
    #[serde(default)]
    pub projected_type: Option<u16>,
    #[serde(default)]
    pub angular_units: Option<u16>,
    #[serde(default)]
    pub linear_units: Option<u16>,
    #[serde(default)]
    pub citation: Option<String>,
}

impl GeoKeys {
    /// Keys for a projected EPSG code.
    pub fn projected(epsg: u16) -> Self {
        Self {
            model_type: Some(ModelType::Projected),
            projected_type: Some(epsg),
            ..Default::default()
        }
    }

    /// Keys for a geographic EPSG code.
    pub fn geographic(epsg: u16) -> Self {
        Self {
            model_type: Some(ModelType::Geographic),
            geographic_type: Some(epsg),
            ..Default::default()
        }
    }

    /// Parse a GeoKeyDirectory with its ASCII parameter tag.
    ///
    /// Keys stored in the double parameter tag only describe user-defined
    /// systems, which resolve to identity, so they are not read.
    pub fn parse(directory: &[u16], ascii_params: &str) -> Result<Self, ProjectionError> {
        if directory.len() < 4 {
            return Err(ProjectionError::MalformedDirectory(format!(
                "header needs 4 values, got {}",
                directory.len()
            )));
        }

        let key_count = directory[3] as usize;
        if directory.len() < 4 + key_count * 4 {
            return Err(ProjectionError::MalformedDirectory(format!(
                "{} keys declared but only {} values present",
                key_count,
                directory.len()
            )));
        }

        let mut keys = GeoKeys::default();

        for entry in directory[4..4 + key_count * 4].chunks_exact(4) {
            let (code, location, count, value) = (entry[0], entry[1], entry[2] as usize, entry[3]);

            let Some(id) = GeoKeyId::from_code(code) else {
                continue;
            };

            match location {
                0 => match id {
                    GeoKeyId::GTModelTypeGeoKey => keys.model_type = ModelType::from_code(value),
                    GeoKeyId::GTRasterTypeGeoKey => keys.raster_type = Some(value),
                    GeoKeyId::GeographicTypeGeoKey => keys.geographic_type = Some(value),
                    GeoKeyId::GeogAngularUnitsGeoKey => keys.angular_units = Some(value),
                    GeoKeyId::ProjectedCSTypeGeoKey => keys.projected_type = Some(value),
                    GeoKeyId::ProjLinearUnitsGeoKey => keys.linear_units = Some(value),
                    _ => {}
                },
                ASCII_PARAMS_TAG => {
                    if matches!(
                        id,
                        GeoKeyId::GTCitationGeoKey | GeoKeyId::PCSCitationGeoKey | GeoKeyId::GeogCitationGeoKey
                    ) && keys.citation.is_none()
                    {
                        let start = value as usize;
                        let text = ascii_params
                            .get(start..start + count)
                            .ok_or_else(|| {
                                ProjectionError::MalformedDirectory(format!("citation at {} out of range", start))
                            })?
                            .trim_end_matches(['|', '\0'])
                            .to_string();
                        keys.citation = Some(text);
                    }
                }
                DOUBLE_PARAMS_TAG => {}
                other => {
                    return Err(ProjectionError::MalformedDirectory(format!(
                        "key {} points at unknown tag {}",
                        code, other
                    )));
                }
            }
        }

        Ok(keys)
    }

    /// EPSG code identifying the coordinate system.
    ///
    /// Projected systems win over geographic ones; user-defined systems
    /// are rejected.
    pub fn epsg(&self) -> Result<u32, ProjectionError> {
        let is_geographic = matches!(self.model_type, Some(ModelType::Geographic));

        let code = match (self.projected_type, self.geographic_type) {
            (Some(p), _) if !is_geographic => p,
            (_, Some(g)) => g,
            (Some(p), None) => p,
            (None, None) => {
                let missing = if is_geographic {
                    GeoKeyId::GeographicTypeGeoKey
                } else {
                    GeoKeyId::ProjectedCSTypeGeoKey
                };
                return Err(ProjectionError::MissingGeoKey(missing));
            }
        };

        if code == USER_DEFINED || code == 0 {
            return Err(ProjectionError::UserDefinedCrs);
        }

        Ok(code as u32)
    }

    /// Canonical definition string, e.g. "EPSG:32633".
    pub fn definition(&self) -> Result<String, ProjectionError> {
        Ok(format!("EPSG:{}", self.epsg()?))
    }
}
