//! # Excavation Rules
//!
//! The rules crate for the fossil dig - soil blocks, the buried fossil, tool
//! policies and level configuration. Everything here is plain data plus the
//! state transitions each entity owns; orchestration lives in `excavation_core`.

pub mod entities;
pub mod error;
pub mod geometry;
pub mod level;
pub mod mechanics;

pub use entities::*;
pub use error::*;
pub use geometry::*;
pub use level::*;
pub use mechanics::*;
