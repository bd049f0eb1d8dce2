//! # Excavation Core
//!
//! The engine side of the fossil dig. It owns the soil grid and the buried
//! fossil, turns tool uses into block and fossil state changes, runs the
//! fade and fall processes, and decides when the level is complete.
//!
//! ## Core Components
//!
//! - **grid**: the soil grid, keyed by cell coordinate
//! - **world**: grid plus fossil, with spatial queries over both
//! - **excavation**: tool dispatch and the removal pipeline
//! - **processes**: tick-driven fade-out and fall/settle
//! - **completion**: the once-only completion latch
//! - **spawner**: catalog selection and spawn-time clearing
//! - **session**: one level of play
//! - **events**: notification hooks for rendering, audio and UI
//!
//! ## Ordering
//!
//! A destructive operation finishes before any of its consequences run.
//! Neighbours are reclassified, then the fossil is notified, then the
//! completion check runs.

pub mod completion;
pub mod error;
pub mod events;
pub mod excavation;
pub mod grid;
pub mod processes;
pub mod session;
pub mod spawner;
pub mod world;

pub use completion::*;
pub use error::*;
pub use events::*;
pub use excavation::*;
pub use grid::*;
pub use processes::*;
pub use session::*;
pub use spawner::*;
pub use world::*;
