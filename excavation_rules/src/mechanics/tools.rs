//! Tool profiles: damage multipliers and validity rules per tool.

use serde::{Deserialize, Serialize};

use super::{SoilType, ToolKind, ToolOutcome};

/// Multiplier applied by chisel/hammer strikes against fossil material in soil.
pub const FRAGILE_SOIL_MULTIPLIER: f32 = 0.5;

/// What a tool does to a soil block in a given state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoilRule {
    /// Apply `base_damage * multiplier`; the drill also clears nearby cells.
    Damage { multiplier: f32, clears_area: bool },
    /// Remove the block without damage.
    Brush,
    /// Glue a damaged fossil fragment back together.
    Repair,
    /// The use is invalid; report this outcome and change nothing.
    Reject(ToolOutcome),
}

/// What a tool does to the fossil itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FossilRule {
    Damage,
    Clean,
    Repair,
}

impl ToolKind {
    /// Rule table for soil blocks.
    pub fn soil_rule(&self, soil: SoilType) -> SoilRule {
        match (self, soil) {
            (ToolKind::Chisel | ToolKind::Hammer, SoilType::Normal | SoilType::NearFossil) => {
                SoilRule::Damage {
                    multiplier: 1.0,
                    clears_area: false,
                }
            }
            (ToolKind::Chisel | ToolKind::Hammer, SoilType::Fossil | SoilType::Damaged) => {
                SoilRule::Damage {
                    multiplier: FRAGILE_SOIL_MULTIPLIER,
                    clears_area: false,
                }
            }
            (ToolKind::ElectricDrill, SoilType::Normal | SoilType::NearFossil) => SoilRule::Damage {
                multiplier: 1.0,
                clears_area: true,
            },
            (ToolKind::ElectricDrill, SoilType::Fossil | SoilType::Damaged) => {
                SoilRule::Reject(ToolOutcome::Forbidden)
            }
            (ToolKind::Brush, SoilType::NearFossil) => SoilRule::Brush,
            (ToolKind::Brush, _) => SoilRule::Reject(ToolOutcome::WrongTarget),
            (ToolKind::Glue, SoilType::Damaged) => SoilRule::Repair,
            (ToolKind::Glue, SoilType::Fossil) => SoilRule::Reject(ToolOutcome::AlreadyRepaired),
            (ToolKind::Glue, _) => SoilRule::Reject(ToolOutcome::WrongTarget),
        }
    }

    /// Rule table for the fossil entity.
    pub fn fossil_rule(&self) -> FossilRule {
        match self {
            ToolKind::Chisel | ToolKind::Hammer | ToolKind::ElectricDrill => FossilRule::Damage,
            ToolKind::Brush => FossilRule::Clean,
            ToolKind::Glue => FossilRule::Repair,
        }
    }

    /// Damage multiplier against the fossil entity.
    pub fn fossil_multiplier(&self) -> f32 {
        match self {
            ToolKind::ElectricDrill => 2.0,
            ToolKind::Chisel | ToolKind::Hammer => 1.5,
            ToolKind::Brush | ToolKind::Glue => 0.0,
        }
    }
}

/// Tunable numbers for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolProfile {
    /// Damage before multipliers and density.
    pub base_damage: f32,
    /// How far the tool reaches from its tip along its forward direction.
    pub reach: f32,
    /// Radius of the strike sphere around the hit point (0 = single target).
    pub hit_radius: f32,
    /// Radius of the drill's area clear around the hit point.
    pub clear_radius: f32,
}

impl Default for ToolProfile {
    fn default() -> Self {
        Self {
            base_damage: 0.0,
            reach: 2.0,
            hit_radius: 0.0,
            clear_radius: 0.0,
        }
    }
}

impl ToolProfile {
    /// Every tunable value with its config key.
    pub fn fields(&self) -> [(&'static str, f32); 4] {
        [
            ("base_damage", self.base_damage),
            ("reach", self.reach),
            ("hit_radius", self.hit_radius),
            ("clear_radius", self.clear_radius),
        ]
    }
}

/// Profiles for every tool, as loaded from level config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolTable {
    /// Shared by chisel and hammer.
    pub chisel_hammer: ToolProfile,
    pub drill: ToolProfile,
    pub brush: ToolProfile,
    pub glue: ToolProfile,
}

impl Default for ToolTable {
    fn default() -> Self {
        Self {
            chisel_hammer: ToolProfile {
                base_damage: 0.5,
                hit_radius: 0.05,
                ..Default::default()
            },
            drill: ToolProfile {
                base_damage: 0.3,
                clear_radius: 0.2,
                ..Default::default()
            },
            brush: ToolProfile::default(),
            glue: ToolProfile::default(),
        }
    }
}

impl ToolTable {
    /// Get the profile for a tool.
    pub fn profile(&self, tool: ToolKind) -> &ToolProfile {
        match tool {
            ToolKind::Chisel | ToolKind::Hammer => &self.chisel_hammer,
            ToolKind::ElectricDrill => &self.drill,
            ToolKind::Brush => &self.brush,
            ToolKind::Glue => &self.glue,
        }
    }
}
