//! Entity definitions for the excavation site.

mod fossil;
mod soil_block;

pub use fossil::*;
pub use soil_block::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a spawned fossil instance.
///
/// Catalog ids repeat across levels; this one never does, so a handle kept
/// from an earlier level or from a fossil that has since been removed can be
/// told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an entity ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a nil/empty entity ID.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer cell position of a soil block in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate shifted by the given offsets.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The 26 cells sharing a face, edge or corner with this one.
    pub fn neighbors(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).filter_map(move |dz| {
                    if dx == 0 && dy == 0 && dz == 0 {
                        None
                    } else {
                        Some(self.offset(dx, dy, dz))
                    }
                })
            })
        })
    }
}

impl From<[i32; 3]> for GridCoord {
    fn from(value: [i32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Reference to something a spatial query can return.
///
/// Never hold one across a mutating step: blocks are referenced by coordinate
/// and may be gone, the fossil by instance id and may have been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Block(GridCoord),
    Fossil(EntityId),
}
