//! Layer configuration and process-level pipeline settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::band::{BandSelection, ColormapChoice};
use crate::error::{RasterError, RasterResult};

/// Configuration supplied by the host UI for one raster layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Which assets to render and how.
    pub selection: BandSelection,

    /// Uniform alpha multiplier applied after compositing.
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Treat exact zero as nodata in integer imagery that declares none.
    ///
    /// A legitimately black pixel is indistinguishable from missing data
    /// under this rule; turn it off for imagery where zero is a valid
    /// measurement.
    #[serde(default = "default_true")]
    pub zero_as_nodata: bool,

    /// Apply the asset's scale/offset before rescaling.
    #[serde(default)]
    pub apply_scale_offset: bool,

    /// Number of entries in the colormap lookup texture.
    #[serde(default = "default_lut_resolution")]
    pub lut_resolution: usize,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_lut_resolution() -> usize {
    256
}

impl LayerConfig {
    pub fn new(selection: BandSelection) -> Self {
        Self {
            selection,
            opacity: default_opacity(),
            zero_as_nodata: true,
            apply_scale_offset: false,
            lut_resolution: default_lut_resolution(),
        }
    }

    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RasterError::invalid_config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> RasterResult<Self> {
        let config: LayerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> RasterResult<Self> {
        let config: LayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// A degenerate rescale range is accepted: it renders constant output.
    pub fn validate(&self) -> RasterResult<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(RasterError::invalid_config(format!(
                "opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }

        if !(2..=4096).contains(&self.lut_resolution) {
            return Err(RasterError::invalid_config(format!(
                "lut_resolution must be 2-4096, got {}",
                self.lut_resolution
            )));
        }

        let keys = self.selection.asset_keys();
        if keys.iter().any(|k| k.trim().is_empty()) {
            return Err(RasterError::invalid_config("band selection has an empty asset key"));
        }

        if let ColormapChoice::Custom(stops) = self.selection.colormap() {
            if stops.is_empty() {
                return Err(RasterError::invalid_config("custom colormap has no stops"));
            }
        }

        if let Some(rescale) = self.selection.rescale() {
            if !rescale.min.is_finite() || !rescale.max.is_finite() {
                return Err(RasterError::invalid_config("rescale bounds must be finite"));
            }
            if rescale.is_degenerate() {
                warn!(min = rescale.min, max = rescale.max, "Degenerate rescale range, output will be constant");
            }
        }

        Ok(())
    }
}

/// Process-wide pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Default LUT resolution for layers that do not override it.
    pub lut_resolution: usize,

    /// Default for `LayerConfig::zero_as_nodata`.
    pub zero_as_nodata: bool,

    /// Upper bound on concurrently rendering tiles per layer.
    pub max_concurrent_tiles: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            lut_resolution: 256,
            zero_as_nodata: true,
            max_concurrent_tiles: 16,
        }
    }
}

impl PipelineSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(val) = std::env::var("RASTER_LUT_RESOLUTION") {
            if let Ok(res) = val.parse() {
                settings.lut_resolution = res;
            }
        }

        if let Ok(val) = std::env::var("RASTER_ZERO_AS_NODATA") {
            settings.zero_as_nodata = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("RASTER_MAX_CONCURRENT_TILES") {
            if let Ok(n) = val.parse() {
                settings.max_concurrent_tiles = n;
            }
        }

        settings
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=4096).contains(&self.lut_resolution) {
            return Err("lut_resolution must be 2-4096".to_string());
        }

        if self.max_concurrent_tiles == 0 {
            return Err("max_concurrent_tiles must be > 0".to_string());
        }

        Ok(())
    }

    /// Layer config for `selection` carrying these defaults.
    pub fn layer_config(&self, selection: BandSelection) -> LayerConfig {
        LayerConfig {
            zero_as_nodata: self.zero_as_nodata,
            lut_resolution: self.lut_resolution,
            ..LayerConfig::new(selection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::RescaleRange;

    #[test]
    fn test_yaml_defaults() {
        let config = LayerConfig::from_yaml_str(
            r#"
selection:
  mode: single
  asset: B04
  colormap: viridis
  rescale: { min: 0, max: 10000 }
"#,
        )
        .unwrap();

        assert_eq!(config.opacity, 1.0);
        assert!(config.zero_as_nodata);
        assert!(!config.apply_scale_offset);
        assert_eq!(config.lut_resolution, 256);
        assert_eq!(config.selection.rescale(), Some(RescaleRange::new(0.0, 10000.0)));
    }

    #[test]
    fn test_invalid_opacity_rejected() {
        let mut config = LayerConfig::new(BandSelection::single("B04", ColormapChoice::None, RescaleRange::new(0.0, 1.0)));
        config.opacity = 1.5;
        assert!(matches!(config.validate(), Err(RasterError::InvalidConfig(_))));
    }

    #[test]
    fn test_degenerate_rescale_accepted() {
        let config = LayerConfig::new(BandSelection::single("B04", ColormapChoice::None, RescaleRange::new(100.0, 100.0)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_validate() {
        assert!(PipelineSettings::default().validate().is_ok());
        let settings = PipelineSettings {
            max_concurrent_tiles: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
