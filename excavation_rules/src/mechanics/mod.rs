//! Game mechanics: soil classifications, fossil states, tools and their rules.

mod tools;

pub use tools::*;

use serde::{Deserialize, Serialize};

/// Semantic classification of a soil block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SoilType {
    /// Plain soil, far from the fossil.
    #[default]
    Normal,
    /// Within detection radius of a buried fossil, not yet cleared.
    NearFossil,
    /// Embedded fossil fragment. Never crumbles from damage.
    Fossil,
    /// Fossil fragment that took too much damage; repairable with glue.
    Damaged,
}

impl SoilType {
    /// Fossil and Damaged blocks are fossil material rather than soil.
    pub fn is_fossil_type(&self) -> bool {
        matches!(self, SoilType::Fossil | SoilType::Damaged)
    }
}

/// Lifecycle of the buried fossil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FossilState {
    /// Still embedded in soil.
    #[default]
    Buried,
    /// Exposed and falling or resting in the pit.
    Excavated,
    /// Brushed clean after excavation.
    Cleaned,
    /// Broken by excessive damage.
    Damaged,
    /// Glued back together.
    Repaired,
    /// Picked up by the player. Terminal.
    Collected,
}

/// Tools the player can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Chisel,
    Hammer,
    ElectricDrill,
    Brush,
    Glue,
}

impl ToolKind {
    /// Chisel and hammer only work as a pair; returns the partner tool.
    pub fn partner(&self) -> Option<ToolKind> {
        match self {
            ToolKind::Chisel => Some(ToolKind::Hammer),
            ToolKind::Hammer => Some(ToolKind::Chisel),
            _ => None,
        }
    }

    /// Outcome reported when the partner tool is missing.
    pub fn missing_partner_outcome(&self) -> Option<ToolOutcome> {
        match self {
            ToolKind::Chisel => Some(ToolOutcome::NeedHammer),
            ToolKind::Hammer => Some(ToolOutcome::NeedChisel),
            _ => None,
        }
    }
}

/// Result code of a single tool use.
///
/// Invalid uses are never errors; the caller may show feedback for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolOutcome {
    /// The tool changed something.
    Applied,
    /// Nothing within reach.
    NoTarget,
    /// Chisel used without a hammer in hand.
    NeedHammer,
    /// Hammer used without a chisel in hand.
    NeedChisel,
    /// The tool does not apply to the target's current state.
    WrongTarget,
    /// The tool is not allowed on this target (drill on fossil material).
    Forbidden,
    /// Fossil has already been cleaned.
    AlreadyClean,
    /// Target is not damaged, nothing to glue.
    AlreadyRepaired,
    /// Fossil is already collected or breaking apart.
    Ignored,
    /// Target no longer exists.
    Stale,
}

impl ToolOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ToolOutcome::Applied)
    }
}
