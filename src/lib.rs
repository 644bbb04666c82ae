//! sledge: continuous-time broad-phase collision scheduling on a sparse grid.
//!
//! Moving rectangles ([`Sledge`]) are registered in a [`CellGrid`], which
//! predicts exact contact times and hands them out in time order. [`Physics`]
//! sits on top, binding game-side [`Sprite`]s to sledges and interleaving
//! their hits with per-sprite timeouts on a shared [`SimClock`].

pub mod types;
pub mod error;
pub mod api;
pub mod geom;
pub mod pool;
pub mod queue;
pub mod clock;
pub mod sledge;
pub mod grid;
pub mod raycast;
pub mod physics;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{PhysicsError, Result};
pub use crate::clock::SimClock;
pub use crate::grid::CellGrid;
pub use crate::physics::{HitCallback, Physics};
pub use crate::pool::{Handle, Pool};
pub use crate::queue::{SkipQueue, Timed};
pub use crate::raycast::RayScan;
pub use crate::sledge::Sledge;
