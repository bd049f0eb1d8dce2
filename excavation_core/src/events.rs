//! Notification hooks for the rendering, audio and UI collaborators.
//!
//! The core never waits on a hook and never reads anything back from one.

use excavation_rules::{CatalogEntry, EntityId, FossilState, GridCoord, SoilType};
use serde::{Deserialize, Serialize};

/// Why a block left the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockRemoval {
    /// Health ran out.
    Crumbled,
    /// Brushed away while NearFossil.
    Brushed,
    /// Caught in the drill's area clear.
    Drilled,
    /// Overlapped the fossil's volume.
    Overlapped,
    /// Inside the clear radius when the fossil spawned.
    SpawnCleared,
    /// Removed by the NearFossil clear shortcut.
    Cleared,
}

/// Why the fossil left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FossilRemoval {
    /// Broke and finished fading out.
    Faded,
    /// Picked up by the player.
    Collected,
}

/// One-way notifications emitted by the core. Every method defaults to a no-op.
pub trait ExcavationHooks {
    fn block_state_changed(&mut self, _coord: GridCoord, _soil_type: SoilType) {}

    fn block_removed(&mut self, _coord: GridCoord, _cause: BlockRemoval) {}

    fn fossil_spawned(&mut self, _id: EntityId, _entry: &CatalogEntry) {}

    fn fossil_state_changed(&mut self, _id: EntityId, _state: FossilState) {}

    /// Opacity of a breaking fossil, from 1.0 down to 0.0.
    fn fossil_fade(&mut self, _id: EntityId, _alpha: f32) {}

    fn fossil_settled(&mut self, _id: EntityId) {}

    fn fossil_removed(&mut self, _id: EntityId, _cause: FossilRemoval) {}

    fn game_complete(&mut self) {}
}

impl ExcavationHooks for () {}

/// A recorded hook call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExcavationEvent {
    BlockStateChanged {
        coord: GridCoord,
        soil_type: SoilType,
    },
    BlockRemoved {
        coord: GridCoord,
        cause: BlockRemoval,
    },
    FossilSpawned {
        id: EntityId,
        fossil_id: u32,
        model_id: u32,
        name: String,
    },
    FossilStateChanged {
        id: EntityId,
        state: FossilState,
    },
    FossilFade {
        id: EntityId,
        alpha: f32,
    },
    FossilSettled {
        id: EntityId,
    },
    FossilRemoved {
        id: EntityId,
        cause: FossilRemoval,
    },
    GameComplete,
}

/// Hook implementation that keeps every notification, in order.
///
/// Useful for tests and for hosts that prefer polling to callbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRecorder {
    events: Vec<ExcavationEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ExcavationEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the recorder empty.
    pub fn drain(&mut self) -> Vec<ExcavationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Count events matching a predicate.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ExcavationEvent) -> bool,
    {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    /// Number of completion signals seen.
    pub fn completions(&self) -> usize {
        self.count(|e| matches!(e, ExcavationEvent::GameComplete))
    }

    /// Serialize the log, e.g. for a host bridging events to another runtime.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }

    /// Removal causes recorded for blocks, in order.
    pub fn removals(&self) -> Vec<(GridCoord, BlockRemoval)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExcavationEvent::BlockRemoved { coord, cause } => Some((*coord, *cause)),
                _ => None,
            })
            .collect()
    }
}

impl ExcavationHooks for EventRecorder {
    fn block_state_changed(&mut self, coord: GridCoord, soil_type: SoilType) {
        self.events
            .push(ExcavationEvent::BlockStateChanged { coord, soil_type });
    }

    fn block_removed(&mut self, coord: GridCoord, cause: BlockRemoval) {
        self.events.push(ExcavationEvent::BlockRemoved { coord, cause });
    }

    fn fossil_spawned(&mut self, id: EntityId, entry: &CatalogEntry) {
        self.events.push(ExcavationEvent::FossilSpawned {
            id,
            fossil_id: entry.fossil_id,
            model_id: entry.model_id,
            name: entry.name.clone(),
        });
    }

    fn fossil_state_changed(&mut self, id: EntityId, state: FossilState) {
        self.events
            .push(ExcavationEvent::FossilStateChanged { id, state });
    }

    fn fossil_fade(&mut self, id: EntityId, alpha: f32) {
        self.events.push(ExcavationEvent::FossilFade { id, alpha });
    }

    fn fossil_settled(&mut self, id: EntityId) {
        self.events.push(ExcavationEvent::FossilSettled { id });
    }

    fn fossil_removed(&mut self, id: EntityId, cause: FossilRemoval) {
        self.events.push(ExcavationEvent::FossilRemoved { id, cause });
    }

    fn game_complete(&mut self) {
        self.events.push(ExcavationEvent::GameComplete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let mut recorder = EventRecorder::new();
        let coord = GridCoord::new(1, 0, 1);

        recorder.block_state_changed(coord, SoilType::NearFossil);
        recorder.block_removed(coord, BlockRemoval::Brushed);
        recorder.game_complete();

        assert_eq!(recorder.events().len(), 3);
        assert_eq!(recorder.completions(), 1);
        assert_eq!(recorder.removals(), vec![(coord, BlockRemoval::Brushed)]);

        let drained = recorder.drain();
        assert_eq!(drained.len(), 3);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_events_serialize() {
        let event = ExcavationEvent::BlockRemoved {
            coord: GridCoord::new(0, 1, 2),
            cause: BlockRemoval::Drilled,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Drilled"));

        let back: ExcavationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_recorder_to_json() {
        let mut recorder = EventRecorder::new();
        recorder.block_removed(GridCoord::new(3, 0, 1), BlockRemoval::Overlapped);
        recorder.game_complete();

        let json = recorder.to_json().unwrap();
        let back: Vec<ExcavationEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_slice(), recorder.events());
    }

    #[test]
    fn test_unit_hooks_are_noops() {
        let mut hooks = ();
        hooks.game_complete();
        hooks.block_removed(GridCoord::new(0, 0, 0), BlockRemoval::Crumbled);
    }
}
