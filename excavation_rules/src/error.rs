//! Configuration errors.

use thiserror::Error;

/// Errors raised while loading or validating a level configuration.
///
/// These are the only hard failures in the rules crate. Tool misuse is
/// reported through [`crate::ToolOutcome`] instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fossil catalog is empty")]
    EmptyCatalog,

    #[error("duplicate fossil id {0} in catalog")]
    DuplicateFossilId(u32),

    #[error("grid dimension `{name}` must be at least 1")]
    ZeroDimension { name: &'static str },

    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("`{name}` must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("`tools.{tool}.{field}` must not be negative, got {value}")]
    NegativeToolValue {
        tool: &'static str,
        field: &'static str,
        value: f32,
    },

    #[error("`{name}` must be within 0..=1, got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },

    #[error("fossil cell {0:?} lies outside the grid")]
    CellOutOfBounds([i32; 3]),

    #[error("fossil spawn point {0:?} lies outside the grid")]
    SpawnOutOfBounds([f32; 3]),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
