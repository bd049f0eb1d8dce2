//! Removal pipeline and per-frame process stepping over one excavation world.

use std::collections::VecDeque;

use excavation_rules::{
    BlockDamage, EntityId, FossilDamage, FossilState, GridCoord, Shape, SoilType, ToolKind,
    ToolOutcome,
};

use crate::completion::{Completion, CompletionEvaluator};
use crate::events::{BlockRemoval, ExcavationHooks, FossilRemoval};
use crate::grid::Proximity;
use crate::processes::{ProcessKind, ProcessStatus};
use crate::world::ExcavationWorld;

/// Totals for one removal batch, cascades included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub removed: usize,
    pub near_fossil_removed: usize,
    /// Completion result, when the batch was evaluated.
    pub completion: Option<Completion>,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub fossil_removed: Option<FossilRemoval>,
    pub fossil_settled: bool,
}

/// Mutable view over the world, the completion latch and the hooks.
///
/// Every destructive operation goes through here so that its consequences
/// (neighbour reclassification, fossil notification, the completion check)
/// run in a fixed order after the mutation, never inside it.
pub struct ExcavationContext<'a, H: ExcavationHooks> {
    pub world: &'a mut ExcavationWorld,
    pub completion: &'a mut CompletionEvaluator,
    pub hooks: &'a mut H,
}

impl<'a, H: ExcavationHooks> ExcavationContext<'a, H> {
    pub fn new(
        world: &'a mut ExcavationWorld,
        completion: &'a mut CompletionEvaluator,
        hooks: &'a mut H,
    ) -> Self {
        Self {
            world,
            completion,
            hooks,
        }
    }

    /// Remove a batch of blocks and resolve every follow-up.
    ///
    /// Coordinates that are already gone are skipped. Blocks the fossil
    /// overlaps after a removal are queued into the same batch. The owning
    /// fossil is notified once per batch, after every removal, and the
    /// completion check runs last when `evaluate` is set.
    pub fn remove_blocks<I>(&mut self, coords: I, evaluate: bool) -> RemovalSummary
    where
        I: IntoIterator<Item = (GridCoord, BlockRemoval)>,
    {
        let mut queue: VecDeque<_> = coords.into_iter().collect();
        let mut owners: Vec<EntityId> = Vec::new();
        let mut summary = RemovalSummary::default();
        let detection_radius = self.world.fossil_config().detection_radius;

        while let Some((coord, cause)) = queue.pop_front() {
            let Some(block) = self.world.grid.remove(coord) else {
                log::trace!("Block {coord} already removed");
                continue;
            };
            summary.removed += 1;
            self.hooks.block_removed(coord, cause);

            if block.soil_type() == SoilType::NearFossil {
                summary.near_fossil_removed += 1;
                if let Some(owner) = block.near_fossil() {
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
            }

            let Some(fossil) = self.world.fossil.as_ref() else {
                continue;
            };
            for neighbor in coord.neighbors() {
                match self.world.grid.classify(neighbor, fossil, detection_radius) {
                    Proximity::Overlaps => queue.push_back((neighbor, BlockRemoval::Overlapped)),
                    Proximity::Near { promoted: true } => {
                        self.hooks
                            .block_state_changed(neighbor, SoilType::NearFossil);
                    }
                    _ => {}
                }
            }
        }

        for owner in owners {
            self.check_surrounding(owner);
        }

        if evaluate && summary.removed > 0 {
            summary.completion =
                Some(self.completion.evaluate(&self.world.grid, &mut *self.hooks));
        }
        summary
    }

    /// Classify every block against the current fossil.
    ///
    /// Overlapping blocks are removed without a completion check.
    pub fn classify_all(&mut self) -> usize {
        let Some(fossil) = self.world.fossil.as_ref() else {
            return 0;
        };
        let detection_radius = self.world.fossil_config().detection_radius;

        let mut overlapping = Vec::new();
        for coord in self.world.grid.coords() {
            match self.world.grid.classify(coord, fossil, detection_radius) {
                Proximity::Overlaps => overlapping.push((coord, BlockRemoval::Overlapped)),
                Proximity::Near { promoted: true } => {
                    self.hooks.block_state_changed(coord, SoilType::NearFossil);
                }
                _ => {}
            }
        }

        self.remove_blocks(overlapping, false);
        self.world.grid.count_of(SoilType::NearFossil)
    }

    /// Apply damage to one block, removing it if it crumbles.
    pub fn damage_block(&mut self, coord: GridCoord, amount: f32) -> Option<BlockDamage> {
        let result = self.world.grid.get_mut(coord)?.take_damage(amount);

        match result {
            BlockDamage::Cracked => {
                log::warn!("Fossil fragment at {coord} cracked");
                self.hooks.block_state_changed(coord, SoilType::Damaged);
            }
            BlockDamage::Crumbled => {
                self.remove_blocks([(coord, BlockRemoval::Crumbled)], true);
            }
            BlockDamage::Weakened { .. } => {}
        }
        Some(result)
    }

    /// Brush away a NearFossil block.
    pub fn brush_block(&mut self, coord: GridCoord) -> ToolOutcome {
        let Some(block) = self.world.grid.get(coord) else {
            return ToolOutcome::Stale;
        };
        if !block.can_brush() {
            return ToolOutcome::WrongTarget;
        }
        self.remove_blocks([(coord, BlockRemoval::Brushed)], true);
        ToolOutcome::Applied
    }

    /// Glue a Damaged fossil fragment.
    pub fn repair_block(&mut self, coord: GridCoord) -> ToolOutcome {
        let Some(block) = self.world.grid.get_mut(coord) else {
            return ToolOutcome::Stale;
        };
        if !block.repair() {
            return ToolOutcome::AlreadyRepaired;
        }
        self.hooks.block_state_changed(coord, SoilType::Fossil);
        ToolOutcome::Applied
    }

    /// Hit the fossil. A break starts the fade.
    pub fn damage_fossil(&mut self, id: EntityId, amount: f32, tool: ToolKind) -> ToolOutcome {
        let Some(fossil) = self.world.fossil_mut(id) else {
            return ToolOutcome::Stale;
        };

        match fossil.take_damage(amount, tool) {
            FossilDamage::Ignored => ToolOutcome::Ignored,
            FossilDamage::Absorbed { durability } => {
                log::debug!("Fossil {id} durability {durability:.1}");
                ToolOutcome::Applied
            }
            FossilDamage::Broke => {
                log::warn!("Fossil {id} broke");
                self.hooks.fossil_state_changed(id, FossilState::Damaged);
                let config = self.world.fossil_config().clone();
                self.world.processes.start_fade(id, &config);
                ToolOutcome::Applied
            }
        }
    }

    pub fn clean_fossil(&mut self, id: EntityId) -> ToolOutcome {
        let Some(fossil) = self.world.fossil_mut(id) else {
            return ToolOutcome::Stale;
        };
        let outcome = fossil.clean();
        if outcome.is_applied() {
            self.hooks.fossil_state_changed(id, FossilState::Cleaned);
        }
        outcome
    }

    pub fn repair_fossil(&mut self, id: EntityId) -> ToolOutcome {
        let Some(fossil) = self.world.fossil_mut(id) else {
            return ToolOutcome::Stale;
        };
        let outcome = fossil.repair();
        if outcome.is_applied() {
            log::info!("Fossil {id} repaired");
            self.hooks.fossil_state_changed(id, FossilState::Repaired);
        }
        outcome
    }

    /// Pick up an exposed fossil at rest and take it out of the world.
    pub fn collect_fossil(&mut self, id: EntityId) -> ToolOutcome {
        let Some(fossil) = self.world.fossil_mut(id) else {
            return ToolOutcome::Stale;
        };
        if fossil.state() == FossilState::Collected {
            return ToolOutcome::Ignored;
        }
        if !fossil.collect() {
            return ToolOutcome::WrongTarget;
        }

        log::info!("Fossil {id} collected");
        self.hooks.fossil_state_changed(id, FossilState::Collected);
        self.world.remove_fossil(id);
        self.hooks.fossil_removed(id, FossilRemoval::Collected);
        ToolOutcome::Applied
    }

    /// Start the fall once no NearFossil soil remains around the fossil.
    pub fn check_surrounding(&mut self, id: EntityId) -> bool {
        let config = self.world.fossil_config().clone();
        let Some(fossil) = self.world.fossil(id) else {
            log::debug!("Fossil {id} is gone; skipping surround check");
            return false;
        };

        let region = Shape::sphere(fossil.position(), config.surround_check_radius);
        let remaining = self
            .world
            .grid
            .blocks_in(&region)
            .into_iter()
            .filter_map(|c| self.world.grid.get(c))
            .filter(|b| b.soil_type() == SoilType::NearFossil)
            .count();
        if remaining > 0 {
            log::trace!("Fossil {id} still has {remaining} NearFossil blocks around it");
            return false;
        }

        let Some(fossil) = self.world.fossil_mut(id) else {
            return false;
        };
        if !fossil.begin_fall() {
            return false;
        }
        let start_y = fossil.position().y;

        log::info!("Fossil {id} exposed; falling");
        self.hooks.fossil_state_changed(id, FossilState::Excavated);
        self.world.processes.start_fall(id, &config, start_y);
        true
    }

    /// Step every running process by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut survivors = Vec::new();

        for mut process in self.world.processes.take() {
            let id = process.target;
            let Some(fossil) = self.world.fossil.as_mut().filter(|f| f.id() == id) else {
                log::debug!("Dropping process for removed fossil {id}");
                continue;
            };

            let status = match &mut process.kind {
                ProcessKind::Fade(fade) => {
                    let (alpha, status) = fade.step(dt);
                    self.hooks.fossil_fade(id, alpha);
                    if status == ProcessStatus::Finished {
                        self.world.fossil = None;
                        log::info!("Fossil {id} faded out");
                        self.hooks.fossil_removed(id, FossilRemoval::Faded);
                        summary.fossil_removed = Some(FossilRemoval::Faded);
                    }
                    status
                }
                ProcessKind::Fall(_) if fossil.is_fading() => {
                    log::debug!("Fossil {id} broke mid-fall; stopping the fall");
                    fossil.stop_fall();
                    ProcessStatus::Finished
                }
                ProcessKind::Fall(fall) => {
                    let rest_y =
                        self.world.grid.support_height(&fossil.bounds()) + fossil.half_extents().y;
                    let (y, status) = fall.step(dt, fossil.position().y, rest_y);
                    fossil.set_height(y);

                    if status == ProcessStatus::Finished && fossil.settle() {
                        log::info!("Fossil {id} settled at height {y:.3}");
                        self.hooks.fossil_settled(id);
                        self.completion.signal_complete(&mut *self.hooks);
                        summary.fossil_settled = true;
                    }
                    status
                }
            };

            if status == ProcessStatus::Running {
                survivors.push(process);
            }
        }

        self.world.processes.restore(survivors);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventRecorder, ExcavationEvent};
    use crate::grid::SoilGrid;
    use excavation_rules::{CatalogEntry, FossilConfig, FossilEntity, GridConfig};
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    /// 5 x 1 x 5 unit grid with the fossil buried in the middle cell and no
    /// NearFossil soil around it.
    fn exposed_world() -> (ExcavationWorld, EntityId) {
        let grid = SoilGrid::generate(&GridConfig {
            width: 5,
            length: 5,
            height: 1,
            spacing: 1.0,
            ..Default::default()
        })
        .unwrap();
        let config = FossilConfig {
            half_extents: Vec3::splat(0.4),
            detection_radius: 0.1,
            clear_radius: 0.0,
            surround_check_radius: 1.0,
            ..Default::default()
        };
        let entry = CatalogEntry {
            fossil_id: 1,
            model_id: 1,
            name: "Ammonite".to_string(),
        };
        let fossil = FossilEntity::new(&entry, Vec3::new(2.0, 0.0, 2.0), &config);
        let id = fossil.id();

        let mut world = ExcavationWorld::new(grid, config);
        world.fossil = Some(fossil);
        (world, id)
    }

    #[test]
    fn test_classify_all_removes_overlapped_cell() {
        let (mut world, _) = exposed_world();
        let mut completion = CompletionEvaluator::new();
        let mut hooks = EventRecorder::new();

        let near = ExcavationContext::new(&mut world, &mut completion, &mut hooks).classify_all();

        assert_eq!(near, 0);
        assert_eq!(world.grid().len(), 24);
        assert_eq!(
            hooks.removals(),
            vec![(GridCoord::new(2, 0, 2), BlockRemoval::Overlapped)]
        );
        assert!(!completion.is_complete());
    }

    #[test]
    fn test_fossil_breaking_mid_fall_stops_the_fall() {
        let (mut world, id) = exposed_world();
        let mut completion = CompletionEvaluator::new();
        let mut hooks = EventRecorder::new();
        let mut ctx = ExcavationContext::new(&mut world, &mut completion, &mut hooks);

        ctx.classify_all();
        assert!(ctx.check_surrounding(id));
        assert!(ctx.world.processes.is_falling(id));

        ctx.tick(DT);
        let fossil = ctx.world.fossil(id).unwrap();
        assert!(fossil.is_falling());
        assert!(fossil.position().y < 0.0);

        let outcome = ctx.damage_fossil(id, 1000.0, ToolKind::ElectricDrill);
        assert_eq!(outcome, ToolOutcome::Applied);

        let summary = ctx.tick(DT);
        assert!(!summary.fossil_settled);
        assert!(!ctx.world.processes.is_falling(id));
        assert!(ctx.world.processes.is_fading(id));

        let fossil = ctx.world.fossil(id).unwrap();
        assert!(fossil.is_fading());
        assert!(!fossil.is_falling());
        assert!(!fossil.is_settled());

        assert!(!ctx.completion.is_complete());
        assert_eq!(
            ctx.hooks
                .count(|e| matches!(e, ExcavationEvent::FossilSettled { .. })),
            0
        );
    }
}
