use thiserror::Error;

use crate::types::{SledgeId, SpriteId};

/// Errors surfaced by the grid, the clock and the physics coordinator.
///
/// Almost everything here is a programmer error in a closed simulation; stale
/// grid entries are never reported through this type, they are pruned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// Construction parameters rejected by [`GridConfig::validate`](crate::GridConfig::validate).
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// An event was computed (or the clock asked to move) earlier than `now`.
    #[error("time regression: event at {time} is before now ({now})")]
    TimeRegression { time: f64, now: f64 },
    /// Durations and delays must be finite and non-negative.
    #[error("invalid time value: {0}")]
    InvalidTime(f64),
    #[error("unknown sprite {0:?}")]
    UnknownSprite(SpriteId),
    #[error("sprite {0:?} is already registered")]
    DuplicateSprite(SpriteId),
    /// The sprite is checked out for one of its own handlers.
    #[error("sprite {0:?} is running a handler")]
    SpriteInUse(SpriteId),
    #[error("unknown sledge {0:?}")]
    UnknownSledge(SledgeId),
    /// `Physics::clock` called from inside a hit or timeout handler.
    #[error("clock called while dispatching")]
    Reentrant,
}

pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;
