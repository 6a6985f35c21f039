//! Colormap lookup-texture cache.
//!
//! One cache is owned per pipeline. It holds the last materialized LUT
//! and is replaced wholesale, never updated in place: a rebuild happens
//! outside the lock and the finished LUT is swapped in, so concurrent
//! tile renders only ever see a complete texture.

use std::sync::Arc;

use renderer::{Colormap, ColormapLut};
use tokio::sync::RwLock;
use tracing::debug;

use crate::metrics::PipelineMetrics;

#[derive(Debug)]
pub struct ColormapTextureCache {
    current: RwLock<Option<Arc<ColormapLut>>>,
    metrics: Arc<PipelineMetrics>,
}

impl ColormapTextureCache {
    pub fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            current: RwLock::new(None),
            metrics,
        }
    }

    /// The cached LUT, built from `colormap` if the cache is empty or
    /// holds another identity or resolution.
    pub async fn get_or_build(&self, colormap: &Colormap, resolution: usize) -> Arc<ColormapLut> {
        let is_current = |lut: &ColormapLut| lut.identity == colormap.identity() && lut.resolution == resolution.max(2);

        if let Some(lut) = self.current.read().await.as_ref() {
            if is_current(lut) {
                return lut.clone();
            }
        }

        let built = Arc::new(colormap.materialize_lut(resolution));

        let mut current = self.current.write().await;
        if let Some(lut) = current.as_ref() {
            // Another render finished the same rebuild first.
            if is_current(lut) {
                return lut.clone();
            }
        }
        *current = Some(built.clone());
        self.metrics.record_lut_build();
        debug!(colormap = %built.identity, resolution = built.resolution, "Built colormap LUT");
        built
    }

    /// Cached LUT without building.
    pub async fn current(&self) -> Option<Arc<ColormapLut>> {
        self.current.read().await.clone()
    }

    /// Drop the cached LUT; the next lookup rebuilds it.
    pub async fn invalidate(&self) {
        if self.current.write().await.take().is_some() {
            debug!("Invalidated colormap LUT");
        }
    }
}
