//! Pipeline metrics.
//!
//! Counters are kept locally (for snapshots and tests) and mirrored to
//! the `metrics` facade. No exporter is installed here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, histogram};
use serde::Serialize;

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    tiles_rendered: AtomicU64,
    tile_errors: AtomicU64,
    lut_builds: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tiles_rendered: u64,
    pub tile_errors: u64,
    pub lut_builds: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tile(&self, strategy: &'static str, duration: Duration) {
        self.tiles_rendered.fetch_add(1, Ordering::Relaxed);
        counter!("raster_tiles_rendered_total", "strategy" => strategy).increment(1);
        histogram!("raster_tile_render_seconds", "strategy" => strategy).record(duration.as_secs_f64());
    }

    pub fn record_error(&self, kind: &'static str) {
        self.tile_errors.fetch_add(1, Ordering::Relaxed);
        counter!("raster_tile_errors_total", "kind" => kind).increment(1);
    }

    pub fn record_lut_build(&self) {
        self.lut_builds.fetch_add(1, Ordering::Relaxed);
        counter!("raster_colormap_lut_builds_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tiles_rendered: self.tiles_rendered.load(Ordering::Relaxed),
            tile_errors: self.tile_errors.load(Ordering::Relaxed),
            lut_builds: self.lut_builds.load(Ordering::Relaxed),
        }
    }
}
