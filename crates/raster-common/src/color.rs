//! Color primitives shared by colormaps and configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RgbRepr", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Replicate one intensity across all channels.
    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Parse "#RRGGBB" (leading '#' optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };

        Rgb {
            r: lerp_u8(self.r, other.r),
            g: lerp_u8(self.g, other.g),
            b: lerp_u8(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

/// Accepted serialized forms: "#RRGGBB" or `[r, g, b]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RgbRepr {
    Hex(String),
    Array([u8; 3]),
}

impl TryFrom<RgbRepr> for Rgb {
    type Error = String;

    fn try_from(repr: RgbRepr) -> Result<Self, Self::Error> {
        match repr {
            RgbRepr::Hex(s) => Rgb::from_hex(&s).ok_or_else(|| format!("invalid hex color '{}'", s)),
            RgbRepr::Array([r, g, b]) => Ok(Rgb::new(r, g, b)),
        }
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(position: f64, color: Rgb) -> Self {
        Self { position, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(Rgb::from_hex("#FF0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::from_hex("00ff00"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
        assert_eq!(Rgb::from_hex("#FFF"), None);
        assert_eq!(Rgb::new(68, 1, 84).to_hex(), "#440154");
    }

    #[test]
    fn test_lerp_midpoint_rounds() {
        let mid = Rgb::BLACK.lerp(&Rgb::WHITE, 0.5);
        assert_eq!(mid, Rgb::gray(128));
        assert_eq!(Rgb::BLACK.lerp(&Rgb::WHITE, 2.0), Rgb::WHITE);
    }

    #[test]
    fn test_stop_deserializes_hex_and_array() {
        let stops: Vec<ColorStop> = serde_json::from_str(
            r##"[{"position": 0.0, "color": "#000000"}, {"position": 1.0, "color": [255, 128, 0]}]"##,
        )
        .unwrap();
        assert_eq!(stops[0].color, Rgb::BLACK);
        assert_eq!(stops[1].color, Rgb::new(255, 128, 0));
    }
}
