//! The buried fossil - the excavation target and its state machine.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::geometry::Aabb;
use crate::level::{CatalogEntry, FossilConfig};
use crate::mechanics::{FossilState, ToolKind, ToolOutcome};

/// Result of hitting the fossil with a tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FossilDamage {
    /// Collected or already breaking apart; the hit was dropped.
    Ignored,
    /// Durability dropped but the fossil holds.
    Absorbed { durability: f32 },
    /// Durability ran out. The fossil is Damaged and must fade out.
    Broke,
}

/// A spawned fossil.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FossilEntity {
    id: EntityId,
    pub fossil_id: u32,
    pub model_id: u32,
    pub name: String,

    position: Vec3,
    half_extents: Vec3,
    /// Cosmetic rotation around Y, in degrees.
    pub yaw_degrees: f32,

    max_durability: f32,
    durability: f32,
    state: FossilState,

    /// Breaking apart; further damage is dropped.
    fading: bool,
    falling: bool,
    settled: bool,
}

impl FossilEntity {
    /// Create a buried fossil for a catalog entry at `position`.
    pub fn new(entry: &CatalogEntry, position: Vec3, config: &FossilConfig) -> Self {
        Self {
            id: EntityId::new(),
            fossil_id: entry.fossil_id,
            model_id: entry.model_id,
            name: entry.name.clone(),
            position,
            half_extents: config.half_extents,
            yaw_degrees: 0.0,
            max_durability: config.max_durability,
            durability: config.max_durability,
            state: FossilState::Buried,
            fading: false,
            falling: false,
            settled: false,
        }
    }

    /// Set the cosmetic yaw.
    pub fn with_yaw(mut self, yaw_degrees: f32) -> Self {
        self.yaw_degrees = yaw_degrees;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    pub fn state(&self) -> FossilState {
        self.state
    }

    pub fn durability(&self) -> f32 {
        self.durability
    }

    pub fn max_durability(&self) -> f32 {
        self.max_durability
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Collision volume.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extent(self.position, self.half_extents)
    }

    /// Move vertically. X and Z stay locked while the fossil falls.
    pub fn set_height(&mut self, y: f32) {
        self.position.y = y;
    }

    /// Hit the fossil with a tool.
    pub fn take_damage(&mut self, amount: f32, tool: ToolKind) -> FossilDamage {
        if self.state == FossilState::Collected || self.fading {
            return FossilDamage::Ignored;
        }

        let actual = amount.max(0.0) * tool.fossil_multiplier();
        // Floor keeps a huge hit from pushing durability arbitrarily negative
        self.durability = (self.durability - actual).max(-self.max_durability);

        if self.durability <= 0.0 {
            self.state = FossilState::Damaged;
            self.fading = true;
            FossilDamage::Broke
        } else {
            FossilDamage::Absorbed {
                durability: self.durability,
            }
        }
    }

    /// Brush the exposed fossil clean.
    pub fn clean(&mut self) -> ToolOutcome {
        match self.state {
            FossilState::Excavated => {
                self.state = FossilState::Cleaned;
                ToolOutcome::Applied
            }
            FossilState::Cleaned => ToolOutcome::AlreadyClean,
            FossilState::Collected => ToolOutcome::Ignored,
            _ => ToolOutcome::WrongTarget,
        }
    }

    /// Glue a damaged fossil, restoring full durability.
    ///
    /// A fade already in progress is not stopped.
    pub fn repair(&mut self) -> ToolOutcome {
        match self.state {
            FossilState::Damaged => {
                self.durability = self.max_durability;
                self.state = FossilState::Repaired;
                ToolOutcome::Applied
            }
            FossilState::Collected => ToolOutcome::Ignored,
            _ => ToolOutcome::AlreadyRepaired,
        }
    }

    /// Pick the fossil up. Only an exposed fossil at rest can be collected.
    pub fn collect(&mut self) -> bool {
        let exposed = matches!(
            self.state,
            FossilState::Excavated | FossilState::Cleaned | FossilState::Repaired
        );
        if !exposed || self.falling || self.fading {
            return false;
        }
        self.state = FossilState::Collected;
        true
    }

    /// Start falling once the surrounding soil is gone.
    ///
    /// Only a buried fossil that is not already falling can start.
    pub fn begin_fall(&mut self) -> bool {
        if self.state != FossilState::Buried || self.falling || self.fading {
            return false;
        }
        self.falling = true;
        self.state = FossilState::Excavated;
        true
    }

    /// Abandon a fall without landing. Returns false if the fossil was not falling.
    pub fn stop_fall(&mut self) -> bool {
        let was_falling = self.falling;
        self.falling = false;
        was_falling
    }

    /// Stop the fall. Returns false if the fossil was not falling.
    pub fn settle(&mut self) -> bool {
        if !self.falling || self.settled {
            return false;
        }
        self.falling = false;
        self.settled = true;
        true
    }
}
