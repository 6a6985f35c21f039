//! Projection resolution with identity fallback and per-raster caching.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tracing::{debug, warn};

use crate::error::ProjectionError;
use crate::geokeys::GeoKeys;
use crate::registry::{is_geographic, ProjectionRegistry, WGS84_LONGLAT};

const WGS84_EPSG: u32 = 4326;

struct Transformer {
    source: Proj,
    target: Proj,
    source_geographic: bool,
}

/// Forward (source to lon/lat) and inverse transforms for one raster.
///
/// An identity context passes coordinates through unchanged. It is used
/// when the source is already WGS 84 lon/lat and when resolution failed.
pub struct ProjectionContext {
    definition: String,
    transformer: Option<Transformer>,
}

impl fmt::Debug for ProjectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionContext")
            .field("definition", &self.definition)
            .field("identity", &self.is_identity())
            .finish()
    }
}

impl ProjectionContext {
    pub fn identity(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            transformer: None,
        }
    }

    /// Build a context from a canonical definition and its proj4 string.
    pub fn from_proj4(definition: impl Into<String>, proj4: &str) -> Result<Self, ProjectionError> {
        let definition = definition.into();
        let invalid = |e: proj4rs::errors::Error| ProjectionError::InvalidDefinition {
            definition: definition.clone(),
            message: format!("{:?}", e),
        };

        let source = Proj::from_proj_string(proj4).map_err(invalid)?;
        let target = Proj::from_proj_string(WGS84_LONGLAT).map_err(invalid)?;

        Ok(Self {
            transformer: Some(Transformer {
                source,
                target,
                source_geographic: is_geographic(proj4),
            }),
            definition,
        })
    }

    /// Canonical source definition, e.g. "EPSG:32633".
    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn is_identity(&self) -> bool {
        self.transformer.is_none()
    }

    /// Source coordinates to (lon, lat) in degrees.
    pub fn forward(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let Some(t) = &self.transformer else {
            return Ok((x, y));
        };

        let mut point = if t.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(&t.source, &t.target, &mut point)
            .map_err(|e| ProjectionError::Transform(format!("{:?}", e)))?;

        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }

    /// (lon, lat) in degrees to source coordinates.
    pub fn inverse(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        let Some(t) = &self.transformer else {
            return Ok((lon, lat));
        };

        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&t.target, &t.source, &mut point)
            .map_err(|e| ProjectionError::Transform(format!("{:?}", e)))?;

        if t.source_geographic {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

/// Resolves GeoKeys into projection contexts, once per raster.
///
/// Resolution never fails: any error is logged and an identity context
/// is cached instead, so a tile may be misplaced but the layer still
/// renders.
pub struct ProjectionResolver {
    registry: ProjectionRegistry,
    cache: RwLock<HashMap<String, Arc<ProjectionContext>>>,
}

impl Default for ProjectionResolver {
    fn default() -> Self {
        Self::new(ProjectionRegistry::new())
    }
}

impl ProjectionResolver {
    pub fn new(registry: ProjectionRegistry) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ProjectionRegistry {
        &self.registry
    }

    /// Context for `raster_id`, resolving on first call only.
    pub fn resolve(&self, raster_id: &str, geo_keys: Option<&GeoKeys>) -> Arc<ProjectionContext> {
        if let Some(ctx) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(raster_id)
        {
            return ctx.clone();
        }

        let ctx = match geo_keys {
            Some(keys) => self.try_resolve(keys).unwrap_or_else(|e| {
                warn!(raster = raster_id, error = %e, "Projection resolution failed, using identity transform");
                ProjectionContext::identity(keys.definition().unwrap_or_else(|_| "unknown".to_string()))
            }),
            None => {
                warn!(raster = raster_id, "Raster has no geokeys, using identity transform");
                ProjectionContext::identity("unknown")
            }
        };

        debug!(
            raster = raster_id,
            definition = ctx.definition(),
            identity = ctx.is_identity(),
            "Resolved projection"
        );

        let ctx = Arc::new(ctx);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(raster_id.to_string())
            .or_insert(ctx)
            .clone()
    }

    /// Resolve without fallback or caching.
    pub fn try_resolve(&self, geo_keys: &GeoKeys) -> Result<ProjectionContext, ProjectionError> {
        let epsg = geo_keys.epsg()?;
        self.context_for_epsg(epsg)
    }

    pub fn context_for_epsg(&self, epsg: u32) -> Result<ProjectionContext, ProjectionError> {
        let definition = format!("EPSG:{}", epsg);
        if epsg == WGS84_EPSG {
            return Ok(ProjectionContext::identity(definition));
        }
        let proj4 = self.registry.proj4(epsg)?;
        ProjectionContext::from_proj4(definition, &proj4)
    }

    /// Number of cached contexts.
    pub fn cached(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop the cached context for a raster that was torn down.
    pub fn evict(&self, raster_id: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(raster_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geokeys::USER_DEFINED;

    fn assert_close(a: (f64, f64), b: (f64, f64), tol: f64) {
        assert!(
            (a.0 - b.0).abs() < tol && (a.1 - b.1).abs() < tol,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_utm_forward_inverse() {
        let resolver = ProjectionResolver::default();
        let ctx = resolver.try_resolve(&GeoKeys::projected(32633)).unwrap();
        assert!(!ctx.is_identity());
        assert_eq!(ctx.definition(), "EPSG:32633");

        // Central meridian of zone 33 on the equator.
        let lonlat = ctx.forward(500000.0, 0.0).unwrap();
        assert_close(lonlat, (15.0, 0.0), 1e-6);

        let xy = ctx.inverse(15.0, 45.0).unwrap();
        let back = ctx.forward(xy.0, xy.1).unwrap();
        assert_close(back, (15.0, 45.0), 1e-6);
    }

    #[test]
    fn test_builtin_laea_origin() {
        let resolver = ProjectionResolver::default();
        let ctx = resolver.try_resolve(&GeoKeys::projected(3035)).unwrap();
        let lonlat = ctx.forward(4321000.0, 3210000.0).unwrap();
        assert_close(lonlat, (10.0, 52.0), 1e-4);
    }

    #[test]
    fn test_wgs84_is_identity() {
        let resolver = ProjectionResolver::default();
        let ctx = resolver.resolve("a", Some(&GeoKeys::geographic(4326)));
        assert!(ctx.is_identity());
        assert_eq!(ctx.forward(12.5, -3.0).unwrap(), (12.5, -3.0));
    }

    #[test]
    fn test_fallback_to_identity() {
        let resolver = ProjectionResolver::default();

        let ctx = resolver.resolve("user-defined", Some(&GeoKeys::projected(USER_DEFINED)));
        assert!(ctx.is_identity());

        let ctx = resolver.resolve("unknown", Some(&GeoKeys::projected(65000)));
        assert!(ctx.is_identity());
        assert_eq!(ctx.definition(), "EPSG:65000");

        let ctx = resolver.resolve("no-keys", None);
        assert!(ctx.is_identity());
        assert_eq!(ctx.inverse(1.0, 2.0).unwrap(), (1.0, 2.0));
    }

    #[test]
    fn test_cached_per_raster() {
        let resolver = ProjectionResolver::default();
        let first = resolver.resolve("scene", Some(&GeoKeys::projected(32633)));
        // Different keys for the same id still return the cached context.
        let second = resolver.resolve("scene", Some(&GeoKeys::geographic(4326)));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached(), 1);

        resolver.evict("scene");
        assert_eq!(resolver.cached(), 0);
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ProjectionRegistry::new();
        registry.register(
            900_001,
            "+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=500000 +y_0=0 +datum=WGS84 +units=m +no_defs",
        );
        let resolver = ProjectionResolver::new(registry);
        let ctx = resolver.context_for_epsg(900_001).unwrap();
        assert_close(ctx.forward(500000.0, 0.0).unwrap(), (9.0, 0.0), 1e-6);
    }
}
