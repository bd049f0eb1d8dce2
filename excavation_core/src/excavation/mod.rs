//! Tool handling - turns a tool use into state changes on blocks and the fossil.

mod context;

pub use context::*;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use excavation_rules::{
    EntityId, EntityRef, FossilRule, GridCoord, Ray, Shape, SoilRule, ToolKind, ToolOutcome,
    ToolProfile, ToolTable,
};

use crate::events::{BlockRemoval, ExcavationHooks};
use crate::world::{RayHit, SpatialIndex};

/// A tool use reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    pub tool: ToolKind,
    /// The tool tip in world space.
    pub target_point: Vec3,
    /// Forward direction of the tool.
    pub direction: Vec3,
}

impl ToolEvent {
    pub fn new(tool: ToolKind, target_point: Vec3, direction: Vec3) -> Self {
        Self {
            tool,
            target_point,
            direction,
        }
    }
}

/// What a tool use did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolReport {
    pub tool: ToolKind,
    pub outcome: ToolOutcome,
    /// The entity the tool's ray hit first.
    pub target: Option<EntityRef>,
    pub blocks_damaged: usize,
    /// Blocks that left the grid, cascades included.
    pub blocks_removed: usize,
}

impl ToolReport {
    fn new(tool: ToolKind) -> Self {
        Self {
            tool,
            outcome: ToolOutcome::NoTarget,
            target: None,
            blocks_damaged: 0,
            blocks_removed: 0,
        }
    }

    fn with_outcome(mut self, outcome: ToolOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Routes tool uses to their targets.
///
/// Chisel and hammer are a pair: each works only while the other is held.
#[derive(Debug, Clone, Default)]
pub struct ExcavationController {
    tools: ToolTable,
    held: HashSet<ToolKind>,
}

impl ExcavationController {
    pub fn new(tools: ToolTable) -> Self {
        Self {
            tools,
            held: HashSet::new(),
        }
    }

    pub fn tools(&self) -> &ToolTable {
        &self.tools
    }

    /// Mark a tool as held in a hand.
    pub fn equip(&mut self, tool: ToolKind) {
        self.held.insert(tool);
    }

    /// Release a tool. Returns false if it was not held.
    pub fn unequip(&mut self, tool: ToolKind) -> bool {
        self.held.remove(&tool)
    }

    pub fn is_held(&self, tool: ToolKind) -> bool {
        self.held.contains(&tool)
    }

    /// Apply one tool use.
    pub fn apply<H: ExcavationHooks>(
        &self,
        event: &ToolEvent,
        ctx: &mut ExcavationContext<'_, H>,
    ) -> ToolReport {
        let report = ToolReport::new(event.tool);

        if let (Some(partner), Some(missing)) =
            (event.tool.partner(), event.tool.missing_partner_outcome())
        {
            if !self.is_held(partner) {
                log::debug!("{:?} used without {:?}", event.tool, partner);
                return report.with_outcome(missing);
            }
        }

        let profile = *self.tools.profile(event.tool);
        let ray = Ray::new(event.target_point, event.direction);
        let Some(hit) = ctx.world.raycast(&ray, profile.reach) else {
            return report;
        };

        let blocks_before = ctx.world.grid().len();
        let mut report = ToolReport {
            target: Some(hit.target),
            ..report
        };

        let mut applied = false;
        let mut rejection = None;
        for target in strike_targets(ctx, &hit, &profile) {
            let outcome = match target {
                EntityRef::Block(coord) => {
                    self.apply_to_block(event.tool, coord, &profile, hit.point, ctx, &mut report)
                }
                EntityRef::Fossil(id) => apply_to_fossil(event.tool, id, &profile, ctx),
            };
            if outcome.is_applied() {
                applied = true;
            } else if rejection.is_none() {
                rejection = Some(outcome);
            }
        }

        report.outcome = if applied {
            ToolOutcome::Applied
        } else {
            rejection.unwrap_or(ToolOutcome::Stale)
        };
        report.blocks_removed = blocks_before.saturating_sub(ctx.world.grid().len());
        log::trace!("{:?} on {:?}: {:?}", event.tool, hit.target, report.outcome);
        report
    }

    fn apply_to_block<H: ExcavationHooks>(
        &self,
        tool: ToolKind,
        coord: GridCoord,
        profile: &ToolProfile,
        hit_point: Vec3,
        ctx: &mut ExcavationContext<'_, H>,
        report: &mut ToolReport,
    ) -> ToolOutcome {
        let Some(soil) = ctx.world.grid().get(coord).map(|b| b.soil_type()) else {
            return ToolOutcome::Stale;
        };

        match tool.soil_rule(soil) {
            SoilRule::Damage {
                multiplier,
                clears_area,
            } => {
                if soil.is_fossil_type() {
                    log::warn!("{tool:?} struck fossil fragment at {coord}");
                }
                ctx.damage_block(coord, profile.base_damage * multiplier);
                report.blocks_damaged += 1;

                if clears_area {
                    clear_area(ctx, hit_point, profile.clear_radius);
                }
                ToolOutcome::Applied
            }
            SoilRule::Brush => ctx.brush_block(coord),
            SoilRule::Repair => ctx.repair_block(coord),
            SoilRule::Reject(outcome) => {
                if outcome == ToolOutcome::Forbidden {
                    log::warn!("{tool:?} refused on fossil fragment at {coord}");
                }
                outcome
            }
        }
    }
}

/// Entities a tool acts on: everything in the strike sphere, or the hit alone.
fn strike_targets<H: ExcavationHooks>(
    ctx: &ExcavationContext<'_, H>,
    hit: &RayHit,
    profile: &ToolProfile,
) -> Vec<EntityRef> {
    if profile.hit_radius > 0.0 {
        let targets = ctx
            .world
            .overlap_region(&Shape::sphere(hit.point, profile.hit_radius));
        if !targets.is_empty() {
            return targets;
        }
    }
    vec![hit.target]
}

fn apply_to_fossil<H: ExcavationHooks>(
    tool: ToolKind,
    id: EntityId,
    profile: &ToolProfile,
    ctx: &mut ExcavationContext<'_, H>,
) -> ToolOutcome {
    match tool.fossil_rule() {
        FossilRule::Damage => ctx.damage_fossil(id, profile.base_damage, tool),
        FossilRule::Clean => ctx.clean_fossil(id),
        FossilRule::Repair => ctx.repair_fossil(id),
    }
}

/// Remove soil around the drill bit. Fossil material is left in place.
fn clear_area<H: ExcavationHooks>(ctx: &mut ExcavationContext<'_, H>, center: Vec3, radius: f32) {
    let grid = ctx.world.grid();
    let coords: Vec<_> = grid
        .coords_in_sphere(center, radius)
        .into_iter()
        .filter(|c| grid.get(*c).is_some_and(|b| !b.soil_type().is_fossil_type()))
        .map(|c| (c, BlockRemoval::Drilled))
        .collect();

    if !coords.is_empty() {
        ctx.remove_blocks(coords, true);
    }
}
