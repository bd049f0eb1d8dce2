//! Session errors.

use excavation_rules::{ConfigError, EntityId};
use thiserror::Error;

/// Errors raised while setting up a level.
///
/// Play itself never fails; tool misuse comes back as a result code.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid level configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("fossil {0} is already placed")]
    FossilAlreadyPlaced(EntityId),
}

pub type Result<T> = std::result::Result<T, SessionError>;
