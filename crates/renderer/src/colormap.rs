//! Color ramps: stop interpolation and lookup-texture materialization.

use raster_common::{ColorStop, ColormapChoice, Rgb};
use serde::Serialize;

use crate::error::{RenderError, Result};
use crate::ramps;

/// Suffix selecting the reversed form of a registry ramp.
pub const REVERSED_SUFFIX: &str = "_r";

/// An ordered, non-empty list of color stops with non-decreasing positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Colormap {
    name: String,
    stops: Vec<ColorStop>,
}

impl Colormap {
    /// Validate and build a colormap.
    ///
    /// Positions outside [0, 1] are accepted; lookups clamp to the
    /// nearest stop.
    pub fn new(name: impl Into<String>, stops: Vec<ColorStop>) -> Result<Self> {
        let name = name.into();

        if stops.is_empty() {
            return Err(RenderError::InvalidColormap(format!("'{}' has no stops", name)));
        }

        if let Some(bad) = stops.iter().find(|s| !s.position.is_finite()) {
            return Err(RenderError::InvalidColormap(format!(
                "'{}' has a non-finite stop position {}",
                name, bad.position
            )));
        }

        if stops.windows(2).any(|w| w[1].position < w[0].position) {
            return Err(RenderError::InvalidColormap(format!(
                "'{}' stop positions must be non-decreasing",
                name
            )));
        }

        Ok(Self { name, stops })
    }

    /// Colormap for a layer's colormap choice, `None` for grayscale.
    pub fn from_choice(choice: &ColormapChoice) -> Result<Option<Self>> {
        match choice {
            ColormapChoice::None => Ok(None),
            ColormapChoice::Named(name) => ramps::named(name)
                .map(Some)
                .ok_or_else(|| RenderError::InvalidColormap(format!("unknown colormap '{}'", name))),
            ColormapChoice::Custom(stops) => Colormap::new(custom_identity(stops), stops.clone()).map(Some),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Identity used to key lookup-texture caches.
    ///
    /// Registry ramps are identified by name; custom ramps by their
    /// stop list.
    pub fn identity(&self) -> &str {
        &self.name
    }

    /// Same ramp traversed from the last stop to the first.
    pub fn reversed(&self) -> Self {
        let name = match self.name.strip_suffix(REVERSED_SUFFIX) {
            Some(base) => base.to_string(),
            None => format!("{}{}", self.name, REVERSED_SUFFIX),
        };
        let stops = self
            .stops
            .iter()
            .rev()
            .map(|s| ColorStop::new(1.0 - s.position, s.color))
            .collect();
        Self { name, stops }
    }

    /// Color at `t`, clamped to [0, 1].
    ///
    /// Linear per-channel interpolation between the bracketing stops.
    /// Coincident stops return the lower stop's color.
    pub fn interpolate(&self, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f64 };

        let first = &self.stops[0];
        if t <= first.position {
            return first.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if t >= lo.position && t <= hi.position {
                if hi.position == lo.position {
                    return lo.color;
                }
                let f = (t - lo.position) / (hi.position - lo.position);
                return lo.color.lerp(&hi.color, f);
            }
        }

        self.stops[self.stops.len() - 1].color
    }

    /// Sample the ramp at `resolution` evenly spaced positions.
    ///
    /// Entry `i` holds the color at `i / (resolution - 1)`, so the first
    /// and last entries are exactly the end colors.
    pub fn materialize_lut(&self, resolution: usize) -> ColormapLut {
        let resolution = resolution.max(2);
        let denom = (resolution - 1) as f32;

        let mut rgba = Vec::with_capacity(resolution * 4);
        for i in 0..resolution {
            let c = self.interpolate(i as f32 / denom);
            rgba.extend_from_slice(&[c.r, c.g, c.b, 255]);
        }

        ColormapLut {
            identity: self.name.clone(),
            resolution,
            rgba,
        }
    }
}

fn custom_identity(stops: &[ColorStop]) -> String {
    let body: Vec<String> = stops
        .iter()
        .map(|s| format!("{}{}", s.position, s.color.to_hex()))
        .collect();
    format!("custom[{}]", body.join(","))
}

/// Fixed-resolution lookup texture materialized from a colormap.
#[derive(Debug, Clone, PartialEq)]
pub struct ColormapLut {
    pub identity: String,
    pub resolution: usize,
    /// `resolution * 4` bytes of RGBA, alpha always 255.
    pub rgba: Vec<u8>,
}

impl ColormapLut {
    /// Nearest entry for an intensity in [0, 1].
    #[inline]
    pub fn lookup(&self, intensity: f32) -> [u8; 4] {
        let t = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        let idx = (t * (self.resolution - 1) as f32).round() as usize;
        let o = idx.min(self.resolution - 1) * 4;
        [self.rgba[o], self.rgba[o + 1], self.rgba[o + 2], self.rgba[o + 3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop() -> Colormap {
        Colormap::new(
            "test",
            vec![
                ColorStop::new(0.0, Rgb::new(0, 0, 255)),
                ColorStop::new(1.0, Rgb::new(255, 0, 0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_endpoints() {
        let cmap = two_stop();
        assert_eq!(cmap.interpolate(0.0), Rgb::new(0, 0, 255));
        assert_eq!(cmap.interpolate(1.0), Rgb::new(255, 0, 0));
        assert_eq!(cmap.interpolate(-3.0), Rgb::new(0, 0, 255));
        assert_eq!(cmap.interpolate(7.0), Rgb::new(255, 0, 0));
        assert_eq!(cmap.interpolate(f32::NAN), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(two_stop().interpolate(0.5), Rgb::new(128, 0, 128));
    }

    #[test]
    fn test_duplicate_positions_step() {
        let cmap = Colormap::new(
            "step",
            vec![
                ColorStop::new(0.0, Rgb::BLACK),
                ColorStop::new(0.5, Rgb::new(10, 10, 10)),
                ColorStop::new(0.5, Rgb::new(200, 200, 200)),
                ColorStop::new(1.0, Rgb::WHITE),
            ],
        )
        .unwrap();
        assert_eq!(cmap.interpolate(0.5), Rgb::new(10, 10, 10));
        assert!(cmap.interpolate(0.51).r >= 200);
    }

    #[test]
    fn test_stops_inside_unit_range_clamp() {
        let cmap = Colormap::new(
            "inner",
            vec![
                ColorStop::new(0.2, Rgb::new(50, 0, 0)),
                ColorStop::new(0.8, Rgb::new(250, 0, 0)),
            ],
        )
        .unwrap();
        assert_eq!(cmap.interpolate(0.0), Rgb::new(50, 0, 0));
        assert_eq!(cmap.interpolate(1.0), Rgb::new(250, 0, 0));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(Colormap::new("e", vec![]), Err(RenderError::InvalidColormap(_))));
        let unordered = vec![ColorStop::new(0.6, Rgb::BLACK), ColorStop::new(0.4, Rgb::WHITE)];
        assert!(Colormap::new("u", unordered).is_err());
        let nan = vec![ColorStop::new(f64::NAN, Rgb::BLACK)];
        assert!(Colormap::new("n", nan).is_err());
    }

    #[test]
    fn test_single_stop() {
        let cmap = Colormap::new("flat", vec![ColorStop::new(0.5, Rgb::new(1, 2, 3))]).unwrap();
        assert_eq!(cmap.interpolate(0.0), Rgb::new(1, 2, 3));
        assert_eq!(cmap.interpolate(0.9), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_lut_endpoints_and_lookup() {
        let lut = two_stop().materialize_lut(256);
        assert_eq!(lut.resolution, 256);
        assert_eq!(lut.rgba.len(), 1024);
        assert_eq!(lut.lookup(0.0), [0, 0, 255, 255]);
        assert_eq!(lut.lookup(1.0), [255, 0, 0, 255]);
        assert_eq!(lut.lookup(2.0), [255, 0, 0, 255]);
        assert_eq!(lut.identity, "test");
    }

    #[test]
    fn test_reversed() {
        let rev = two_stop().reversed();
        assert_eq!(rev.name(), "test_r");
        assert_eq!(rev.interpolate(0.0), Rgb::new(255, 0, 0));
        assert_eq!(rev.interpolate(1.0), Rgb::new(0, 0, 255));
        assert_eq!(rev.reversed().name(), "test");
    }

    #[test]
    fn test_from_choice() {
        assert!(Colormap::from_choice(&ColormapChoice::None).unwrap().is_none());
        let viridis = Colormap::from_choice(&ColormapChoice::Named("viridis".into())).unwrap().unwrap();
        assert_eq!(viridis.identity(), "viridis");
        assert!(Colormap::from_choice(&ColormapChoice::Named("nope".into())).is_err());

        let stops = vec![ColorStop::new(0.0, Rgb::BLACK), ColorStop::new(1.0, Rgb::WHITE)];
        let a = Colormap::from_choice(&ColormapChoice::Custom(stops.clone())).unwrap().unwrap();
        let b = Colormap::from_choice(&ColormapChoice::Custom(stops)).unwrap().unwrap();
        assert_eq!(a.identity(), b.identity());
        assert!(a.identity().starts_with("custom["));
    }
}
