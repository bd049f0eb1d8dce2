//! The dig site - soil grid, the fossil and its running processes.

mod spatial;

pub use spatial::*;

use excavation_rules::{EntityId, EntityRef, FossilConfig, FossilEntity, Ray, Shape};

use crate::grid::SoilGrid;
use crate::processes::ProcessTable;

/// Everything physically present in one level.
///
/// The fossil is reached through its id. Lookups check the id so that a
/// handle held past the fossil's removal resolves to nothing.
#[derive(Debug, Clone)]
pub struct ExcavationWorld {
    pub(crate) grid: SoilGrid,
    pub(crate) fossil: Option<FossilEntity>,
    pub(crate) processes: ProcessTable,
    fossil_config: FossilConfig,
}

impl ExcavationWorld {
    pub fn new(grid: SoilGrid, fossil_config: FossilConfig) -> Self {
        Self {
            grid,
            fossil: None,
            processes: ProcessTable::default(),
            fossil_config,
        }
    }

    pub fn grid(&self) -> &SoilGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut SoilGrid {
        &mut self.grid
    }

    pub fn fossil_config(&self) -> &FossilConfig {
        &self.fossil_config
    }

    /// The fossil currently in the world, if any.
    pub fn current_fossil(&self) -> Option<&FossilEntity> {
        self.fossil.as_ref()
    }

    /// Get the fossil by id. Returns `None` once it has been removed.
    pub fn fossil(&self, id: EntityId) -> Option<&FossilEntity> {
        self.fossil.as_ref().filter(|f| f.id() == id)
    }

    pub fn fossil_mut(&mut self, id: EntityId) -> Option<&mut FossilEntity> {
        self.fossil.as_mut().filter(|f| f.id() == id)
    }

    /// Take the fossil out of the world.
    pub(crate) fn remove_fossil(&mut self, id: EntityId) -> Option<FossilEntity> {
        if self.fossil(id).is_none() {
            return None;
        }
        self.fossil.take()
    }

    /// Check whether an entity reference still resolves.
    pub fn is_alive(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Block(coord) => self.grid.contains(coord),
            EntityRef::Fossil(id) => self.fossil(id).is_some(),
        }
    }

    /// Number of running fade and fall processes.
    pub fn active_processes(&self) -> usize {
        self.processes.len()
    }
}

impl SpatialIndex for ExcavationWorld {
    fn overlap_region(&self, region: &Shape) -> Vec<EntityRef> {
        let mut hits: Vec<EntityRef> = self
            .grid
            .blocks_in(region)
            .into_iter()
            .map(EntityRef::Block)
            .collect();

        if let Some(fossil) = &self.fossil {
            if region.intersects_aabb(&fossil.bounds()) {
                hits.push(EntityRef::Fossil(fossil.id()));
            }
        }
        hits
    }

    fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        let block_hit = self
            .grid
            .raycast(ray, max_distance)
            .map(|(coord, distance)| (EntityRef::Block(coord), distance));

        let fossil_hit = self.fossil.as_ref().and_then(|fossil| {
            let distance = ray.intersects_aabb(&fossil.bounds())?;
            (distance <= max_distance).then_some((EntityRef::Fossil(fossil.id()), distance))
        });

        // Ties go to the fossil
        let (target, distance) = match (block_hit, fossil_hit) {
            (Some(block), Some(fossil)) if block.1 < fossil.1 => block,
            (_, Some(fossil)) => fossil,
            (block, None) => block?,
        };

        Some(RayHit {
            target,
            point: ray.at(distance),
            distance,
        })
    }
}
