//! One level of play: owns the world, the tool controller, the completion
//! latch and the host's hooks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use excavation_rules::{EntityId, LevelConfig, SoilType, ToolKind, ToolOutcome};

use crate::completion::CompletionEvaluator;
use crate::error::Result;
use crate::events::{BlockRemoval, ExcavationHooks, FossilRemoval};
use crate::excavation::{
    ExcavationContext, ExcavationController, TickSummary, ToolEvent, ToolReport,
};
use crate::grid::SoilGrid;
use crate::spawner::FossilSpawner;
use crate::world::ExcavationWorld;

/// Where the level stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelOutcome {
    InProgress,
    /// Completion was signaled.
    Complete,
    /// The fossil broke and faded away before completion.
    FossilLost,
}

/// A running excavation level.
pub struct ExcavationSession<H: ExcavationHooks = ()> {
    config: LevelConfig,
    world: ExcavationWorld,
    controller: ExcavationController,
    completion: CompletionEvaluator,
    hooks: H,
    fossil_id: EntityId,
    fossil_removal: Option<FossilRemoval>,
}

impl<H: ExcavationHooks> ExcavationSession<H> {
    /// Start a level, seeding selection from the config when it has a seed.
    pub fn start(config: LevelConfig, hooks: H) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::start_with_rng(config, hooks, &mut rng)
    }

    /// Start a level with a caller-supplied random source.
    pub fn start_with_rng<R: Rng + ?Sized>(
        config: LevelConfig,
        mut hooks: H,
        rng: &mut R,
    ) -> Result<Self> {
        if let Err(err) = config.validate() {
            log::error!("Rejected level configuration: {err}");
            return Err(err.into());
        }

        let grid = SoilGrid::generate(&config.grid)?;
        let mut world = ExcavationWorld::new(grid, config.fossil.clone());
        let mut completion = CompletionEvaluator::new();

        let fossil_id = {
            let mut ctx = ExcavationContext::new(&mut world, &mut completion, &mut hooks);
            FossilSpawner::new(&config.catalog).spawn(rng, &mut ctx)?
        };

        log::info!(
            "Level started: {} blocks, {} NearFossil",
            world.grid().len(),
            world.grid().count_of(SoilType::NearFossil)
        );

        Ok(Self {
            controller: ExcavationController::new(config.tools),
            config,
            world,
            completion,
            hooks,
            fossil_id,
            fossil_removal: None,
        })
    }

    fn context(&mut self) -> ExcavationContext<'_, H> {
        ExcavationContext::new(&mut self.world, &mut self.completion, &mut self.hooks)
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn world(&self) -> &ExcavationWorld {
        &self.world
    }

    pub fn controller(&self) -> &ExcavationController {
        &self.controller
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Consume the session, returning the hooks.
    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Id of the fossil spawned for this level.
    pub fn fossil_id(&self) -> EntityId {
        self.fossil_id
    }

    pub fn equip(&mut self, tool: ToolKind) {
        self.controller.equip(tool);
    }

    pub fn unequip(&mut self, tool: ToolKind) -> bool {
        self.controller.unequip(tool)
    }

    /// Apply one tool use from the host.
    pub fn apply_tool(&mut self, event: &ToolEvent) -> ToolReport {
        let mut ctx =
            ExcavationContext::new(&mut self.world, &mut self.completion, &mut self.hooks);
        self.controller.apply(event, &mut ctx)
    }

    /// Advance fades and falls by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickSummary {
        let summary = self.context().tick(dt);
        if let Some(removal) = summary.fossil_removed {
            self.fossil_removal = Some(removal);
        }
        summary
    }

    /// Pick up the exposed fossil.
    pub fn collect_fossil(&mut self, id: EntityId) -> ToolOutcome {
        let outcome = self.context().collect_fossil(id);
        if outcome.is_applied() {
            self.fossil_removal = Some(FossilRemoval::Collected);
        }
        outcome
    }

    /// Remove every NearFossil block in one batch. Returns how many went.
    pub fn clear_near_fossil_soil(&mut self) -> usize {
        let coords: Vec<_> = self
            .world
            .grid()
            .coords()
            .into_iter()
            .filter(|c| {
                self.world
                    .grid()
                    .get(*c)
                    .is_some_and(|b| b.soil_type() == SoilType::NearFossil)
            })
            .map(|c| (c, BlockRemoval::Cleared))
            .collect();

        log::info!("Clearing {} NearFossil blocks", coords.len());
        self.context().remove_blocks(coords, true).removed
    }

    pub fn has_uncleared_near_fossil_blocks(&self) -> bool {
        self.completion
            .has_uncleared_near_fossil_blocks(self.world.grid())
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_complete()
    }

    pub fn outcome(&self) -> LevelOutcome {
        if self.completion.is_complete() {
            LevelOutcome::Complete
        } else if self.fossil_removal == Some(FossilRemoval::Faded) {
            LevelOutcome::FossilLost
        } else {
            LevelOutcome::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::events::{EventRecorder, ExcavationEvent};
    use excavation_rules::{
        CatalogEntry, ConfigError, FossilCatalog, FossilConfig, FossilState, GridConfig, GridCoord,
    };
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    /// The ring of NearFossil cells around the center of a 5 x 5 layer.
    const RING: [(i32, i32); 8] = [
        (1, 1),
        (1, 2),
        (1, 3),
        (2, 1),
        (2, 3),
        (3, 1),
        (3, 2),
        (3, 3),
    ];

    fn level() -> LevelConfig {
        LevelConfig {
            seed: Some(7),
            grid: GridConfig {
                width: 5,
                length: 5,
                height: 1,
                spacing: 1.0,
                ..Default::default()
            },
            fossil: FossilConfig {
                spawn_point: Vec3::new(2.0, 0.0, 2.0),
                half_extents: Vec3::splat(0.4),
                detection_radius: 1.0,
                clear_radius: 0.0,
                surround_check_radius: 1.0,
                ..Default::default()
            },
            catalog: FossilCatalog::new(vec![CatalogEntry {
                fossil_id: 1,
                model_id: 10,
                name: "Trilobite".to_string(),
            }]),
            ..Default::default()
        }
    }

    fn start(config: LevelConfig) -> ExcavationSession<EventRecorder> {
        ExcavationSession::start(config, EventRecorder::new()).unwrap()
    }

    fn down_at(tool: ToolKind, x: i32, z: i32) -> ToolEvent {
        ToolEvent::new(tool, Vec3::new(x as f32, 1.5, z as f32), Vec3::NEG_Y)
    }

    fn brush(session: &mut ExcavationSession<EventRecorder>, x: i32, z: i32) -> ToolReport {
        session.apply_tool(&down_at(ToolKind::Brush, x, z))
    }

    fn run_for(session: &mut ExcavationSession<EventRecorder>, seconds: f32) {
        let ticks = (seconds / DT).ceil() as usize;
        for _ in 0..ticks {
            session.tick(DT);
        }
    }

    #[test]
    fn test_spawn_scenario() {
        let session = start(level());
        let grid = session.world().grid();

        assert_eq!(grid.count_of(SoilType::NearFossil), 8);
        assert_eq!(grid.count_of(SoilType::Normal), 16);
        assert!(!grid.contains(GridCoord::new(2, 0, 2)));
        for (x, z) in RING {
            assert_eq!(
                grid.get(GridCoord::new(x, 0, z)).unwrap().soil_type(),
                SoilType::NearFossil
            );
        }

        assert_eq!(session.outcome(), LevelOutcome::InProgress);
        assert!(session.has_uncleared_near_fossil_blocks());
        assert_eq!(session.hooks().completions(), 0);
    }

    #[test]
    fn test_clearing_ring_completes_once() {
        let mut session = start(level());

        for (x, z) in &RING[..7] {
            assert_eq!(brush(&mut session, *x, *z).outcome, ToolOutcome::Applied);
        }
        assert!(!session.is_complete());
        assert!(session.has_uncleared_near_fossil_blocks());
        assert_eq!(session.hooks().completions(), 0);

        let (x, z) = RING[7];
        brush(&mut session, x, z);
        assert!(session.is_complete());
        assert_eq!(session.outcome(), LevelOutcome::Complete);
        assert_eq!(session.hooks().completions(), 1);

        // Exposed and falling
        let fossil = session.world().fossil(session.fossil_id()).unwrap();
        assert_eq!(fossil.state(), FossilState::Excavated);
        assert!(fossil.is_falling());

        // Further removals do not signal again
        session.equip(ToolKind::Chisel);
        session.equip(ToolKind::Hammer);
        session.apply_tool(&down_at(ToolKind::Chisel, 0, 0));
        let report = session.apply_tool(&down_at(ToolKind::Chisel, 0, 0));
        assert_eq!(report.outcome, ToolOutcome::Applied);
        assert_eq!(report.blocks_removed, 1);
        assert_eq!(session.clear_near_fossil_soil(), 0);
        assert_eq!(session.hooks().completions(), 1);
    }

    #[test]
    fn test_fossil_settles_after_fall() {
        let mut session = start(level());
        let id = session.fossil_id();
        session.clear_near_fossil_soil();
        assert_eq!(session.world().active_processes(), 1);

        run_for(&mut session, 3.0);

        let fossil = session.world().fossil(id).unwrap();
        assert!(fossil.is_settled());
        assert!(!fossil.is_falling());
        // Resting on the grid floor
        assert!((fossil.position().y - (-0.5 + 0.4)).abs() < 0.001);
        assert_eq!(session.world().active_processes(), 0);

        let hooks = session.hooks();
        assert_eq!(
            hooks.count(|e| matches!(e, ExcavationEvent::FossilSettled { .. })),
            1
        );
        assert_eq!(hooks.completions(), 1);
    }

    #[test]
    fn test_clean_and_collect() {
        let mut session = start(level());
        let id = session.fossil_id();
        session.clear_near_fossil_soil();

        // Still falling
        assert_eq!(session.collect_fossil(id), ToolOutcome::WrongTarget);

        run_for(&mut session, 3.0);

        let report = session.apply_tool(&down_at(ToolKind::Brush, 2, 2));
        assert_eq!(report.outcome, ToolOutcome::Applied);
        assert_eq!(
            session.world().fossil(id).unwrap().state(),
            FossilState::Cleaned
        );
        let report = session.apply_tool(&down_at(ToolKind::Brush, 2, 2));
        assert_eq!(report.outcome, ToolOutcome::AlreadyClean);

        assert_eq!(session.collect_fossil(id), ToolOutcome::Applied);
        assert!(session.world().current_fossil().is_none());
        assert_eq!(session.collect_fossil(id), ToolOutcome::Stale);
        assert_eq!(session.outcome(), LevelOutcome::Complete);

        let hooks = session.into_hooks();
        assert!(hooks.events().contains(&ExcavationEvent::FossilRemoved {
            id,
            cause: FossilRemoval::Collected,
        }));
    }

    #[test]
    fn test_broken_fossil_fades_away() {
        let mut config = level();
        config.tools.drill.base_damage = 60.0;
        let mut session = start(config);
        let id = session.fossil_id();

        let report = session.apply_tool(&down_at(ToolKind::ElectricDrill, 2, 2));
        assert_eq!(report.outcome, ToolOutcome::Applied);
        assert_eq!(
            session.world().fossil(id).unwrap().state(),
            FossilState::Damaged
        );

        for _ in 0..5 {
            session.tick(0.25);
        }
        assert!(session.world().fossil(id).is_some());
        assert_eq!(session.outcome(), LevelOutcome::InProgress);

        let summary = session.tick(0.25);
        assert_eq!(summary.fossil_removed, Some(FossilRemoval::Faded));
        assert!(session.world().fossil(id).is_none());
        assert_eq!(session.outcome(), LevelOutcome::FossilLost);

        let alphas: Vec<f32> = session
            .hooks()
            .events()
            .iter()
            .filter_map(|e| match e {
                ExcavationEvent::FossilFade { alpha, .. } => Some(*alpha),
                _ => None,
            })
            .collect();
        assert_eq!(alphas.len(), 6);
        assert!(alphas.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(alphas.last(), Some(&0.0));
    }

    #[test]
    fn test_repair_does_not_stop_fade() {
        let mut config = level();
        config.tools.drill.base_damage = 60.0;
        let mut session = start(config);
        let id = session.fossil_id();

        session.apply_tool(&down_at(ToolKind::ElectricDrill, 2, 2));
        let report = session.apply_tool(&down_at(ToolKind::Glue, 2, 2));
        assert_eq!(report.outcome, ToolOutcome::Applied);

        let fossil = session.world().fossil(id).unwrap();
        assert_eq!(fossil.state(), FossilState::Repaired);
        assert_eq!(fossil.durability(), fossil.max_durability());

        run_for(&mut session, 2.0);
        assert!(session.world().fossil(id).is_none());
        assert_eq!(session.outcome(), LevelOutcome::FossilLost);
    }

    #[test]
    fn test_process_dropped_for_removed_fossil() {
        let mut session = start(level());
        let id = session.fossil_id();
        session.clear_near_fossil_soil();
        assert!(session.world().processes.is_falling(id));

        session.world.remove_fossil(id);
        session.tick(DT);

        assert_eq!(session.world().active_processes(), 0);
        assert_eq!(
            session
                .hooks()
                .count(|e| matches!(e, ExcavationEvent::FossilSettled { .. })),
            0
        );
    }

    #[test]
    fn test_chisel_pairing() {
        let mut session = start(level());

        let report = session.apply_tool(&down_at(ToolKind::Chisel, 0, 0));
        assert_eq!(report.outcome, ToolOutcome::NeedHammer);
        assert_eq!(report.blocks_damaged, 0);

        session.equip(ToolKind::Chisel);
        session.equip(ToolKind::Hammer);
        let report = session.apply_tool(&down_at(ToolKind::Chisel, 0, 0));
        assert_eq!(report.outcome, ToolOutcome::Applied);
        assert_eq!(report.blocks_damaged, 1);

        session.unequip(ToolKind::Chisel);
        let report = session.apply_tool(&down_at(ToolKind::Hammer, 0, 0));
        assert_eq!(report.outcome, ToolOutcome::NeedChisel);
    }

    #[test]
    fn test_drill_on_fossil_cell_is_forbidden() {
        let mut config = level();
        config.grid.fossil_cells = vec![[0, 0, 0]];
        let mut session = start(config);

        let report = session.apply_tool(&down_at(ToolKind::ElectricDrill, 0, 0));
        assert_eq!(report.outcome, ToolOutcome::Forbidden);

        let cell = session.world().grid().get(GridCoord::new(0, 0, 0)).unwrap();
        assert_eq!(cell.health(), 1.0);
        assert_eq!(cell.soil_type(), SoilType::Fossil);
    }

    #[test]
    fn test_seeded_start_is_reproducible() {
        let mut config = level();
        config.seed = Some(42);
        config.catalog = FossilCatalog::new(
            (1..=5)
                .map(|i| CatalogEntry {
                    fossil_id: i,
                    model_id: i * 10,
                    name: format!("Fossil {i}"),
                })
                .collect(),
        );

        let a = ExcavationSession::start(config.clone(), ()).unwrap();
        let b = ExcavationSession::start(config, ()).unwrap();

        let fa = a.world().current_fossil().unwrap();
        let fb = b.world().current_fossil().unwrap();
        assert_eq!(fa.fossil_id, fb.fossil_id);
        assert_eq!(fa.yaw_degrees, fb.yaw_degrees);
        assert_ne!(fa.id(), fb.id());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = level();
        config.catalog = FossilCatalog::default();

        let result = ExcavationSession::start(config, ());
        assert!(matches!(
            result,
            Err(SessionError::Config(ConfigError::EmptyCatalog))
        ));
    }

    #[test]
    fn test_start_from_toml() {
        let config = LevelConfig::from_toml_str(
            r#"
            seed = 1

            [grid]
            width = 5
            length = 5
            height = 1
            spacing = 1.0

            [fossil]
            spawn_point = [2.0, 0.0, 2.0]
            half_extents = [0.4, 0.4, 0.4]
            detection_radius = 1.0
            clear_radius = 0.0

            [[catalog]]
            fossil_id = 4
            model_id = 40
            name = "Ammonite"
            "#,
        )
        .unwrap();

        let session = ExcavationSession::start(config, EventRecorder::new()).unwrap();
        assert_eq!(session.world().grid().count_of(SoilType::NearFossil), 8);
        assert_eq!(session.world().current_fossil().unwrap().name, "Ammonite");
    }
}
