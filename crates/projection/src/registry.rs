//! EPSG code to proj4 definition lookup.
//!
//! Regional systems common in national and continental imagery are
//! built in so they resolve without a network lookup. Everything else
//! falls through to the `crs-definitions` database.

use std::collections::HashMap;

use crate::error::ProjectionError;

/// Display coordinate system.
pub const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

const BUILTIN: &[(u32, &str)] = &[
    // ETRS89 / LAEA Europe
    (
        3035,
        "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    // ETRS89 / LCC Europe
    (
        3034,
        "+proj=lcc +lat_0=52 +lon_0=10 +lat_1=35 +lat_2=65 +x_0=4000000 +y_0=2800000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    // CH1903+ / LV95
    (
        2056,
        "+proj=somerc +lat_0=46.9524055555556 +lon_0=7.43958333333333 +k_0=1 +x_0=2600000 +y_0=1200000 +ellps=bessel +towgs84=674.374,15.056,405.346,0,0,0,0 +units=m +no_defs",
    ),
    // OSGB36 / British National Grid
    (
        27700,
        "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs",
    ),
    // RGF93 / Lambert-93
    (
        2154,
        "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    // GDA94 / Australian Albers
    (
        3577,
        "+proj=aea +lat_0=0 +lon_0=132 +lat_1=-18 +lat_2=-36 +x_0=0 +y_0=0 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    // NZGD2000 / New Zealand Transverse Mercator
    (
        2193,
        "+proj=tmerc +lat_0=0 +lon_0=173 +k=0.9996 +x_0=1600000 +y_0=10000000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    // NAD83 / Conus Albers
    (
        5070,
        "+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs",
    ),
    // NSIDC Sea Ice Polar Stereographic North
    (
        3413,
        "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
    ),
    // Antarctic Polar Stereographic
    (
        3031,
        "+proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
    ),
    // WGS 84 / NSIDC EASE-Grid 2.0 Global
    (
        6933,
        "+proj=cea +lat_ts=30 +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
    ),
];

/// Where a definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSource {
    Custom,
    Builtin,
    Database,
}

/// EPSG code to proj4 string lookup.
///
/// Lookup order: custom registrations, built-in regional table,
/// `crs-definitions`.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRegistry {
    custom: HashMap<u32, String>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a definition for `epsg`.
    pub fn register(&mut self, epsg: u32, proj4: impl Into<String>) {
        self.custom.insert(epsg, proj4.into());
    }

    /// EPSG codes in the built-in table.
    pub fn builtin_codes() -> impl Iterator<Item = u32> {
        BUILTIN.iter().map(|(code, _)| *code)
    }

    pub fn lookup(&self, epsg: u32) -> Result<(String, DefinitionSource), ProjectionError> {
        if let Some(def) = self.custom.get(&epsg) {
            return Ok((def.clone(), DefinitionSource::Custom));
        }

        if let Some((_, def)) = BUILTIN.iter().find(|(code, _)| *code == epsg) {
            return Ok((def.to_string(), DefinitionSource::Builtin));
        }

        u16::try_from(epsg)
            .ok()
            .and_then(crs_definitions::from_code)
            .map(|def| (def.proj4.to_string(), DefinitionSource::Database))
            .ok_or(ProjectionError::UnknownEpsg(epsg))
    }

    /// proj4 string for `epsg`.
    pub fn proj4(&self, epsg: u32) -> Result<String, ProjectionError> {
        self.lookup(epsg).map(|(def, _)| def)
    }
}

/// Whether a proj4 string describes a lon/lat system.
pub fn is_geographic(proj4: &str) -> bool {
    proj4.contains("+proj=longlat") || proj4.contains("+proj=latlong")
}
