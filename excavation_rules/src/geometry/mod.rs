//! Geometry primitives for spatial queries: boxes, rays and query shapes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box defined by min and max corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from min and max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from its center and half-extents.
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if a point is inside the box (faces included).
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Check if two boxes touch or intersect (shared faces count).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Check if two boxes share interior volume.
    ///
    /// Boxes that only share a face or an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
    }

    /// Euclidean distance from a point to the box, zero when inside.
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        p.distance(clamped)
    }

    /// Check if a sphere touches the box.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_to_point(center) <= radius
    }

    /// Check if the XZ footprints of two boxes overlap, ignoring height.
    pub fn overlaps_footprint(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// A ray defined by origin and normalized direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    /// Create a ray. The direction is normalized; a zero direction yields a ray
    /// that hits nothing.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Point along the ray at parameter `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray-AABB intersection using the slab method.
    ///
    /// Returns the entry distance, clamped to 0 when the origin is inside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<f32> {
        if self.direction == Vec3::ZERO {
            return None;
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let (min, max) = (aabb.min[axis], aabb.max[axis]);

            // Parallel to this slab: inside it or never hits
            if self.direction[axis] == 0.0 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let t1 = (min - origin) * self.inv_direction[axis];
            let t2 = (max - origin) * self.inv_direction[axis];
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}

/// Region shapes accepted by spatial queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    Box(Aabb),
}

impl Shape {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    /// Smallest box enclosing the shape.
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Sphere { center, radius } => {
                Aabb::from_center_half_extent(*center, Vec3::splat(*radius))
            }
            Shape::Box(aabb) => *aabb,
        }
    }

    /// Check if the shape touches a box.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        match self {
            Shape::Sphere { center, radius } => aabb.intersects_sphere(*center, *radius),
            Shape::Box(region) => region.intersects(aabb),
        }
    }
}
