//! Built-in named color ramps.
//!
//! Sequential ramps are sampled from the matplotlib / ColorBrewer
//! definitions at evenly spaced positions.

use raster_common::{ColorStop, Rgb};

use crate::colormap::{Colormap, REVERSED_SUFFIX};

enum Stops {
    /// Colors evenly spaced over [0, 1].
    Even(&'static [u32]),
    /// Explicit (position, color) pairs.
    At(&'static [(f64, u32)]),
}

const RAMPS: &[(&str, Stops)] = &[
    // Perceptually uniform
    (
        "viridis",
        Stops::Even(&[
            0x440154, 0x472d7b, 0x3b528b, 0x2c728e, 0x21918c, 0x28ae80, 0x5ec962, 0xaddc30, 0xfde725,
        ]),
    ),
    (
        "plasma",
        Stops::Even(&[
            0x0d0887, 0x4c02a1, 0x7e03a8, 0xa92395, 0xcc4778, 0xe56b5d, 0xf89540, 0xfdc527, 0xf0f921,
        ]),
    ),
    (
        "inferno",
        Stops::Even(&[
            0x000004, 0x1f0c48, 0x550f6d, 0x88226a, 0xba3655, 0xe35933, 0xf98e09, 0xf9cb35, 0xfcffa4,
        ]),
    ),
    (
        "magma",
        Stops::Even(&[
            0x000004, 0x1c1044, 0x4f127b, 0x812581, 0xb5367a, 0xe55064, 0xfb8761, 0xfec287, 0xfcfdbf,
        ]),
    ),
    (
        "cividis",
        Stops::Even(&[
            0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8779, 0xa69d75, 0xc4b56c, 0xfee838,
        ]),
    ),
    (
        "turbo",
        Stops::Even(&[
            0x30123b, 0x4662d7, 0x36aaf9, 0x1ae4b6, 0x72fe5e, 0xc8ef34, 0xfaba39, 0xf66b19, 0xca2a04, 0x7a0403,
        ]),
    ),
    // Grayscale
    ("gray", Stops::Even(&[0x000000, 0xffffff])),
    ("greys", Stops::Even(&[0xffffff, 0x000000])),
    // Terrain and classic
    (
        "terrain",
        Stops::At(&[
            (0.0, 0x333399),
            (0.15, 0x0099ff),
            (0.25, 0x00cc66),
            (0.5, 0xffff99),
            (0.75, 0x805c54),
            (1.0, 0xffffff),
        ]),
    ),
    (
        "hot",
        Stops::At(&[(0.0, 0x000000), (0.365, 0xff0000), (0.746, 0xffff00), (1.0, 0xffffff)]),
    ),
    (
        "jet",
        Stops::At(&[
            (0.0, 0x00007f),
            (0.125, 0x0000ff),
            (0.375, 0x00ffff),
            (0.625, 0xffff00),
            (0.875, 0xff0000),
            (1.0, 0x7f0000),
        ]),
    ),
    // Diverging
    (
        "rdbu",
        Stops::Even(&[
            0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3, 0x2166ac,
            0x053061,
        ]),
    ),
    (
        "rdylgn",
        Stops::Even(&[
            0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xd9ef8b, 0xa6d96a, 0x66bd63, 0x1a9850,
            0x006837,
        ]),
    ),
    (
        "spectral",
        Stops::Even(&[
            0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4, 0x66c2a5, 0x3288bd,
            0x5e4fa2,
        ]),
    ),
    (
        "brbg",
        Stops::Even(&[
            0x543005, 0x8c510a, 0xbf812d, 0xdfc27d, 0xf6e8c3, 0xf5f5f5, 0xc7eae5, 0x80cdc1, 0x35978f, 0x01665e,
            0x003c30,
        ]),
    ),
    (
        "piyg",
        Stops::Even(&[
            0x8e0152, 0xc51b7d, 0xde77ae, 0xf1b6da, 0xfde0ef, 0xf7f7f7, 0xe6f5d0, 0xb8e186, 0x7fbc41, 0x4d9221,
            0x276419,
        ]),
    ),
    (
        "coolwarm",
        Stops::Even(&[0x3b4cc0, 0x8db0fe, 0xdddcdc, 0xf4987a, 0xb40426]),
    ),
    // Single hue
    (
        "blues",
        Stops::Even(&[
            0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
        ]),
    ),
    (
        "greens",
        Stops::Even(&[
            0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
        ]),
    ),
    (
        "reds",
        Stops::Even(&[
            0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
        ]),
    ),
    (
        "ylorrd",
        Stops::Even(&[
            0xffffcc, 0xffeda0, 0xfed976, 0xfeb24c, 0xfd8d3c, 0xfc4e2a, 0xe31a1c, 0xbd0026, 0x800026,
        ]),
    ),
    // Vegetation index, bare soil to dense canopy
    (
        "ndvi",
        Stops::At(&[
            (0.0, 0xd73027),
            (0.25, 0xfc8d59),
            (0.5, 0xfee08b),
            (0.625, 0xd9ef8b),
            (0.75, 0x91cf60),
            (1.0, 0x1a9850),
        ]),
    ),
];

/// Aliases accepted in addition to the canonical names.
const ALIASES: &[(&str, &str)] = &[("grey", "gray"), ("grayscale", "gray"), ("greyscale", "gray")];

fn rgb(hex: u32) -> Rgb {
    Rgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

fn build(name: &str, stops: &Stops) -> Option<Colormap> {
    let stops: Vec<ColorStop> = match stops {
        Stops::Even(colors) => {
            let denom = (colors.len() - 1).max(1) as f64;
            colors
                .iter()
                .enumerate()
                .map(|(i, &c)| ColorStop::new(i as f64 / denom, rgb(c)))
                .collect()
        }
        Stops::At(pairs) => pairs.iter().map(|&(p, c)| ColorStop::new(p, rgb(c))).collect(),
    };

    Colormap::new(name, stops).ok()
}

/// Canonical names of the built-in ramps.
pub fn names() -> Vec<&'static str> {
    RAMPS.iter().map(|(name, _)| *name).collect()
}

/// Look up a ramp by name (case-insensitive). A `_r` suffix reverses it.
pub fn named(name: &str) -> Option<Colormap> {
    let lower = name.trim().to_ascii_lowercase();

    if let Some(base) = lower.strip_suffix(REVERSED_SUFFIX) {
        if let Some(cmap) = lookup(base) {
            return Some(cmap.reversed());
        }
    }

    lookup(&lower)
}

fn lookup(name: &str) -> Option<Colormap> {
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
        .unwrap_or(name);

    RAMPS
        .iter()
        .find(|(n, _)| *n == canonical)
        .and_then(|(n, stops)| build(n, stops))
}
