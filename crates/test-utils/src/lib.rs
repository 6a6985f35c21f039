//! Shared test utilities for the raster tile workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic rasters with predictable sample patterns
//! - A Sentinel-2-like STAC item fixture
//! - A scripted raster source that fails chosen windows and counts calls
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod rasters;
pub mod scripted;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use rasters::*;
pub use scripted::ScriptedSource;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that every channel of two RGBA pixels differs by at most `$tolerance`.
#[macro_export]
macro_rules! assert_pixel_near {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left: [u8; 4] = $left;
        let right: [u8; 4] = $right;
        for i in 0..4 {
            let diff = (left[i] as i32 - right[i] as i32).abs();
            if diff > $tolerance {
                panic!(
                    "assertion failed: pixels differ in channel {}\n  left: `{:?}`,\n right: `{:?}`",
                    i, left, right
                );
            }
        }
    }};
}
