//! Tests for the colormap engine and the built-in ramp registry.

use raster_common::{ColorStop, Rgb};
use renderer::{ramps, Colormap};

#[test]
fn test_endpoints_match_stops_for_all_ramps() {
    for name in ramps::names() {
        let cmap = ramps::named(name).unwrap();
        let stops = cmap.stops();
        assert_eq!(cmap.interpolate(0.0), stops[0].color, "{}", name);
        assert_eq!(cmap.interpolate(1.0), stops[stops.len() - 1].color, "{}", name);
    }
}

#[test]
fn test_interpolation_continuous_between_stops() {
    // Without duplicate positions, a tiny step in t can only move each
    // channel by a small amount.
    for name in ramps::names() {
        let cmap = ramps::named(name).unwrap();
        let steps = 4096;
        let mut prev = cmap.interpolate(0.0);
        for i in 1..=steps {
            let c = cmap.interpolate(i as f32 / steps as f32);
            for (a, b) in [(prev.r, c.r), (prev.g, c.g), (prev.b, c.b)] {
                assert!((a as i32 - b as i32).abs() <= 3, "{} jumps at step {}", name, i);
            }
            prev = c;
        }
    }
}

#[test]
fn test_interpolation_monotonic_within_segment() {
    let cmap = Colormap::new(
        "ramp",
        vec![ColorStop::new(0.0, Rgb::new(0, 200, 50)), ColorStop::new(1.0, Rgb::new(200, 0, 50))],
    )
    .unwrap();

    let mut prev = cmap.interpolate(0.0);
    for i in 1..=100 {
        let c = cmap.interpolate(i as f32 / 100.0);
        assert!(c.r >= prev.r);
        assert!(c.g <= prev.g);
        assert_eq!(c.b, 50);
        prev = c;
    }
}

#[test]
fn test_lut_matches_interpolate() {
    let cmap = ramps::named("turbo").unwrap();
    let lut = cmap.materialize_lut(256);

    for i in [0usize, 1, 64, 127, 128, 200, 255] {
        let expected = cmap.interpolate(i as f32 / 255.0);
        let o = i * 4;
        assert_eq!(&lut.rgba[o..o + 4], &[expected.r, expected.g, expected.b, 255], "entry {}", i);
    }
}

#[test]
fn test_lut_resolution_floor() {
    let lut = ramps::named("gray").unwrap().materialize_lut(1);
    assert_eq!(lut.resolution, 2);
    assert_eq!(lut.lookup(0.0), [0, 0, 0, 255]);
    assert_eq!(lut.lookup(1.0), [255, 255, 255, 255]);
}

#[test]
fn test_custom_colormap_from_json() {
    let stops: Vec<ColorStop> = serde_json::from_str(
        r##"[
            {"position": 0.0, "color": "#000000"},
            {"position": 0.5, "color": [255, 0, 0]},
            {"position": 1.0, "color": "#ffffff"}
        ]"##,
    )
    .unwrap();

    let cmap = Colormap::new("custom", stops).unwrap();
    assert_eq!(cmap.interpolate(0.5), Rgb::new(255, 0, 0));
    assert_eq!(cmap.interpolate(0.75), Rgb::new(255, 128, 128));
}
