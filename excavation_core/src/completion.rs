//! End-of-level detection.

use excavation_rules::SoilType;
use serde::{Deserialize, Serialize};

use crate::events::ExcavationHooks;
use crate::grid::SoilGrid;

/// Result of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    /// NearFossil soil remains.
    Uncleared { remaining: usize },
    /// This pass completed the level.
    Completed,
    /// The level was already complete; nothing was checked.
    AlreadyComplete,
}

/// Watches the grid for the win condition and latches completion once.
#[derive(Debug, Clone, Default)]
pub struct CompletionEvaluator {
    complete: bool,
}

impl CompletionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True while any NearFossil block is still in the grid.
    pub fn has_uncleared_near_fossil_blocks(&self, grid: &SoilGrid) -> bool {
        grid.blocks().any(|b| b.soil_type() == SoilType::NearFossil)
    }

    /// Check the grid and signal completion the first time it is clear.
    pub fn evaluate<H: ExcavationHooks>(&mut self, grid: &SoilGrid, hooks: &mut H) -> Completion {
        if self.complete {
            return Completion::AlreadyComplete;
        }

        let remaining = grid.count_of(SoilType::NearFossil);
        if remaining > 0 {
            log::trace!("{remaining} NearFossil blocks remain");
            return Completion::Uncleared { remaining };
        }

        self.signal_complete(hooks);
        Completion::Completed
    }

    /// Latch completion. Returns false if it was already latched.
    ///
    /// Shared by the soil check and the fossil landing so the level only
    /// completes once whichever happens first.
    pub fn signal_complete<H: ExcavationHooks>(&mut self, hooks: &mut H) -> bool {
        if self.complete {
            log::debug!("Completion already signaled");
            return false;
        }
        self.complete = true;
        log::info!("Excavation complete");
        hooks.game_complete();
        true
    }
}
