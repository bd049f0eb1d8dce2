//! Spatial queries over blocks and the fossil.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use excavation_rules::{EntityRef, Ray, Shape};

/// Nearest entity along a ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub target: EntityRef,
    pub point: Vec3,
    pub distance: f32,
}

/// Geometric queries over everything physically present in the dig site.
///
/// Results are a snapshot. Callers must not hold them across anything that
/// removes entities.
pub trait SpatialIndex {
    /// Every live entity whose volume touches the region.
    fn overlap_region(&self, region: &Shape) -> Vec<EntityRef>;

    /// The nearest live entity hit within `max_distance`.
    fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RayHit>;
}
