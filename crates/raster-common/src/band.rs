//! Raster assets and band selection.

use serde::{Deserialize, Serialize};

use crate::color::ColorStop;
use crate::sample::SampleFormat;

/// A raster-typed catalog asset with its per-band metadata.
///
/// Created once by the asset resolver and never mutated afterwards.
/// Every optional catalog field is already an explicit `Option` here,
/// so downstream code never re-inspects the raw catalog JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterAsset {
    /// Key of the asset in the item's asset map (e.g. "B04", "red").
    pub key: String,

    pub href: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub media_type: Option<String>,

    /// Declared sample encoding; the decoder trusts the file over this.
    #[serde(default)]
    pub sample_format: Option<SampleFormat>,

    /// Number of samples per pixel (3 for pre-packed true-color assets).
    #[serde(default = "default_samples_per_pixel")]
    pub samples_per_pixel: usize,

    #[serde(default)]
    pub nodata: Option<f64>,

    #[serde(default)]
    pub scale: Option<f64>,

    #[serde(default)]
    pub offset: Option<f64>,

    /// Center wavelength in micrometers.
    #[serde(default)]
    pub center_wavelength: Option<f64>,

    /// Spectral common name ("red", "nir", ...).
    #[serde(default)]
    pub common_name: Option<String>,
}

fn default_samples_per_pixel() -> usize {
    1
}

impl RasterAsset {
    /// Create an asset with only the required fields set.
    pub fn new(key: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            href: href.into(),
            title: None,
            media_type: None,
            sample_format: None,
            samples_per_pixel: 1,
            nodata: None,
            scale: None,
            offset: None,
            center_wavelength: None,
            common_name: None,
        }
    }

    /// Whether this asset already holds display-ready RGB triples.
    pub fn is_native_rgb(&self) -> bool {
        self.samples_per_pixel == 3 && matches!(self.sample_format, Some(SampleFormat::Uint8) | None)
    }

    /// Apply the asset's scale/offset to a raw sample.
    #[inline]
    pub fn physical_value(&self, raw: f64) -> f64 {
        raw * self.scale.unwrap_or(1.0) + self.offset.unwrap_or(0.0)
    }
}

/// The `[min, max]` raw-value window mapped linearly onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RescaleRange {
    pub min: f64,
    pub max: f64,
}

impl RescaleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Default range for a sample encoding.
    pub fn for_format(format: SampleFormat) -> Self {
        let (min, max) = format.default_range();
        Self { min, max }
    }

    /// `max == min` (or inverted): normalization degrades to constant output.
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    /// Whether the range is exactly the 8-bit identity window.
    pub fn is_byte_identity(&self) -> bool {
        self.min == 0.0 && self.max == 255.0
    }
}

/// Colormap requested for a single-band layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ColormapRepr", into = "ColormapRepr")]
pub enum ColormapChoice {
    /// Grayscale replication, no color lookup.
    #[default]
    None,
    /// Registry ramp, optionally suffixed `_r` for the reversed ramp.
    Named(String),
    /// Explicit ordered stop list.
    Custom(Vec<ColorStop>),
}

impl ColormapChoice {
    pub fn is_none(&self) -> bool {
        matches!(self, ColormapChoice::None)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColormapRepr {
    Name(String),
    Stops(Vec<ColorStop>),
    Wrapped { stops: Vec<ColorStop> },
}

impl From<ColormapRepr> for ColormapChoice {
    fn from(repr: ColormapRepr) -> Self {
        match repr {
            ColormapRepr::Name(name) if name.is_empty() || name.eq_ignore_ascii_case("none") => {
                ColormapChoice::None
            }
            ColormapRepr::Name(name) => ColormapChoice::Named(name),
            ColormapRepr::Stops(stops) | ColormapRepr::Wrapped { stops } => ColormapChoice::Custom(stops),
        }
    }
}

impl From<ColormapChoice> for ColormapRepr {
    fn from(choice: ColormapChoice) -> Self {
        match choice {
            ColormapChoice::None => ColormapRepr::Name("none".to_string()),
            ColormapChoice::Named(name) => ColormapRepr::Name(name),
            ColormapChoice::Custom(stops) => ColormapRepr::Stops(stops),
        }
    }
}

/// Which assets a layer renders and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BandSelection {
    /// One asset, grayscale or colormapped.
    Single {
        asset: String,
        #[serde(default)]
        colormap: ColormapChoice,
        #[serde(default)]
        rescale: Option<RescaleRange>,
    },
    /// Three co-registered assets composited as red, green, blue.
    Rgb {
        assets: [String; 3],
        #[serde(default)]
        rescale: Option<RescaleRange>,
    },
}

impl BandSelection {
    pub fn single(asset: impl Into<String>, colormap: ColormapChoice, rescale: RescaleRange) -> Self {
        BandSelection::Single {
            asset: asset.into(),
            colormap,
            rescale: Some(rescale),
        }
    }

    pub fn rgb(red: impl Into<String>, green: impl Into<String>, blue: impl Into<String>, rescale: RescaleRange) -> Self {
        BandSelection::Rgb {
            assets: [red.into(), green.into(), blue.into()],
            rescale: Some(rescale),
        }
    }

    /// Asset keys in band order.
    pub fn asset_keys(&self) -> Vec<&str> {
        match self {
            BandSelection::Single { asset, .. } => vec![asset.as_str()],
            BandSelection::Rgb { assets, .. } => assets.iter().map(|s| s.as_str()).collect(),
        }
    }

    pub fn rescale(&self) -> Option<RescaleRange> {
        match self {
            BandSelection::Single { rescale, .. } | BandSelection::Rgb { rescale, .. } => *rescale,
        }
    }

    pub fn colormap(&self) -> &ColormapChoice {
        const NONE: &ColormapChoice = &ColormapChoice::None;
        match self {
            BandSelection::Single { colormap, .. } => colormap,
            BandSelection::Rgb { .. } => NONE,
        }
    }

    pub fn is_rgb(&self) -> bool {
        matches!(self, BandSelection::Rgb { .. })
    }
}
