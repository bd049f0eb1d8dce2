//! Fossil placement at level start.

use rand::Rng;

use excavation_rules::{CatalogEntry, ConfigError, EntityId, FossilCatalog, FossilEntity};

use crate::error::{Result, SessionError};
use crate::events::{BlockRemoval, ExcavationHooks};
use crate::excavation::ExcavationContext;

/// Picks a fossil from the catalog and buries it.
#[derive(Debug, Clone, Copy)]
pub struct FossilSpawner<'a> {
    catalog: &'a FossilCatalog,
}

impl<'a> FossilSpawner<'a> {
    pub fn new(catalog: &'a FossilCatalog) -> Self {
        Self { catalog }
    }

    /// Choose a catalog entry uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&'a CatalogEntry> {
        if self.catalog.is_empty() {
            log::error!("Cannot spawn a fossil: catalog is empty");
            return Err(ConfigError::EmptyCatalog.into());
        }
        let index = rng.gen_range(0..self.catalog.len());
        self.catalog
            .get(index)
            .ok_or_else(|| ConfigError::EmptyCatalog.into())
    }

    /// Place a random fossil at the spawn point and prepare the soil around it.
    ///
    /// Blocks inside the clear radius and blocks the fossil overlaps are
    /// removed, and the rest are classified. None of this counts toward
    /// completion.
    pub fn spawn<R, H>(&self, rng: &mut R, ctx: &mut ExcavationContext<'_, H>) -> Result<EntityId>
    where
        R: Rng + ?Sized,
        H: ExcavationHooks,
    {
        if let Some(existing) = ctx.world.current_fossil() {
            return Err(SessionError::FossilAlreadyPlaced(existing.id()));
        }

        let entry = self.choose(rng)?;
        let config = ctx.world.fossil_config().clone();
        let yaw: f32 = rng.gen_range(0.0..360.0);

        let fossil = FossilEntity::new(entry, config.spawn_point, &config).with_yaw(yaw);
        let id = fossil.id();
        ctx.world.fossil = Some(fossil);

        log::info!(
            "Spawned fossil '{}' (fossil {}, model {}) at {} as {id}",
            entry.name,
            entry.fossil_id,
            entry.model_id,
            config.spawn_point
        );
        ctx.hooks.fossil_spawned(id, entry);

        let cleared: Vec<_> = ctx
            .world
            .grid()
            .coords_in_sphere(config.spawn_point, config.clear_radius)
            .into_iter()
            .map(|c| (c, BlockRemoval::SpawnCleared))
            .collect();
        let cleared = ctx.remove_blocks(cleared, false).removed;

        let near = ctx.classify_all();
        log::debug!("Spawn cleared {cleared} blocks, {near} NearFossil remain");
        Ok(id)
    }
}
