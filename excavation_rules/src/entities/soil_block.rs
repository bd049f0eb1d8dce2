//! Soil block - one destructible cell of the excavation medium.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{EntityId, GridCoord};
use crate::geometry::Aabb;
use crate::mechanics::SoilType;

/// Smallest density a block may have; damage is divided by it.
pub const MIN_DENSITY: f32 = 0.001;

/// Health a fossil fragment is pinned to when it cracks.
pub const CRACKED_HEALTH: f32 = 0.5;

/// Result of applying damage to a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BlockDamage {
    /// Health dropped but the block holds.
    Weakened { health: f32 },
    /// Health ran out; the block must be removed from the grid.
    Crumbled,
    /// A fossil fragment broke and became Damaged instead of crumbling.
    Cracked,
}

/// Appearance hint for the rendering side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilTint {
    /// How much to darken the base color toward black (0 = none).
    pub darken: f32,
    /// Opacity, fading as the block weakens.
    pub alpha: f32,
}

/// A single soil block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilBlock {
    pub coord: GridCoord,

    /// World-space center.
    center: Vec3,

    /// Edge length of the cube.
    size: f32,

    /// Damage divisor, always positive.
    density: f32,

    /// Moisture from 0.0 (dry) to 1.0 (wet).
    pub moisture: f32,

    /// 1.0 = intact, 0.0 = gone.
    health: f32,

    soil_type: SoilType,

    /// The fossil that classified this block as NearFossil.
    near_fossil: Option<EntityId>,
}

impl SoilBlock {
    /// Create an intact Normal block.
    ///
    /// A non-positive density is a programming error; it is clamped to
    /// [`MIN_DENSITY`] in release builds.
    pub fn new(coord: GridCoord, center: Vec3, size: f32, density: f32) -> Self {
        debug_assert!(density > 0.0, "soil density must be positive, got {density}");
        Self {
            coord,
            center,
            size,
            density: density.max(MIN_DENSITY),
            moisture: 0.5,
            health: 1.0,
            soil_type: SoilType::Normal,
            near_fossil: None,
        }
    }

    /// Set the moisture level.
    pub fn with_moisture(mut self, moisture: f32) -> Self {
        self.moisture = moisture.clamp(0.0, 1.0);
        self
    }

    /// Set the initial classification.
    pub fn with_soil_type(mut self, soil_type: SoilType) -> Self {
        self.soil_type = soil_type;
        self
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn soil_type(&self) -> SoilType {
        self.soil_type
    }

    pub fn near_fossil(&self) -> Option<EntityId> {
        self.near_fossil
    }

    /// The block's volume.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extent(self.center, Vec3::splat(self.size * 0.5))
    }

    /// Apply damage, scaled down by density.
    pub fn take_damage(&mut self, amount: f32) -> BlockDamage {
        let actual = amount.max(0.0) / self.density;
        self.health = (self.health - actual).max(0.0);

        if self.health > 0.0 {
            return BlockDamage::Weakened {
                health: self.health,
            };
        }

        if self.soil_type == SoilType::Fossil {
            self.soil_type = SoilType::Damaged;
            self.health = CRACKED_HEALTH;
            BlockDamage::Cracked
        } else {
            BlockDamage::Crumbled
        }
    }

    /// Glue a damaged fragment. Returns false when there was nothing to repair.
    pub fn repair(&mut self) -> bool {
        if self.soil_type != SoilType::Damaged {
            return false;
        }
        self.health = 1.0;
        self.soil_type = SoilType::Fossil;
        true
    }

    /// Only NearFossil soil can be brushed away.
    pub fn can_brush(&self) -> bool {
        self.soil_type == SoilType::NearFossil
    }

    /// Promote a Normal block to NearFossil. Returns true if it changed.
    pub fn mark_near_fossil(&mut self, fossil: EntityId) -> bool {
        if self.soil_type != SoilType::Normal {
            return false;
        }
        self.soil_type = SoilType::NearFossil;
        self.near_fossil = Some(fossil);
        true
    }

    /// Appearance hint: wetter soil is darker, weaker soil is more transparent.
    pub fn tint(&self) -> SoilTint {
        SoilTint {
            darken: lerp(0.2, 0.0, self.moisture),
            alpha: lerp(0.5, 1.0, self.health),
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}
