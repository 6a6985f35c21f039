//! A raster source wrapper with scripted failures and call counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use projection::GeoKeys;
use raster_common::{GeoTransform, SampleBuffer, TileWindow};
use tile_decoder::{MemoryRaster, RasterSource, SampleLayout, SourceError};

/// Wraps a [`MemoryRaster`], failing reads of chosen windows.
///
/// Counts `geo_keys` and `read_rasters` calls so tests can check how
/// often the pipeline touches the source.
#[derive(Debug)]
pub struct ScriptedSource {
    inner: MemoryRaster,
    failing: Mutex<Vec<TileWindow>>,
    geo_key_calls: AtomicUsize,
    reads: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(inner: MemoryRaster) -> Self {
        Self {
            inner,
            failing: Mutex::new(Vec::new()),
            geo_key_calls: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    /// Make every read of `window` fail with an I/O error.
    pub fn fail_window(self, window: TileWindow) -> Self {
        self.failing.lock().expect("failing windows lock").push(window);
        self
    }

    /// Stop failing every window.
    pub fn heal(&self) {
        self.failing.lock().expect("failing windows lock").clear();
    }

    pub fn geo_key_calls(&self) -> usize {
        self.geo_key_calls.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RasterSource for ScriptedSource {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn image_count(&self) -> usize {
        self.inner.image_count()
    }

    fn dimensions(&self, level: usize) -> Option<(usize, usize)> {
        self.inner.dimensions(level)
    }

    fn sample_layout(&self) -> SampleLayout {
        self.inner.sample_layout()
    }

    fn geo_keys(&self) -> Option<GeoKeys> {
        self.geo_key_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.geo_keys()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.inner.geo_transform()
    }

    async fn read_rasters(&self, level: usize, window: TileWindow) -> Result<SampleBuffer, SourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let fails = self.failing.lock().expect("failing windows lock").contains(&window);
        if fails {
            return Err(SourceError::Io(format!("connection reset reading {}", window)));
        }
        self.inner.read_rasters(level, window).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasters::gradient_raster;

    #[tokio::test]
    async fn test_scripted_failure_and_heal() {
        let window = TileWindow::new(0, 0, 2, 2);
        let source = ScriptedSource::new(gradient_raster("r", 4, 4)).fail_window(window);

        assert!(matches!(source.read_rasters(0, window).await, Err(SourceError::Io(_))));
        assert!(source.read_rasters(0, TileWindow::new(2, 2, 2, 2)).await.is_ok());

        source.heal();
        assert!(source.read_rasters(0, window).await.is_ok());
        assert_eq!(source.reads(), 3);
    }
}
