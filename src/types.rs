use glam::DVec2;

use crate::error::{PhysicsError, Result};
use crate::pool::Handle;

/// Collision category. Only configured group pairs are checked against each other.
pub type Group = usize;

/// Handle of a sledge registered in a [`CellGrid`](crate::CellGrid).
///
/// Carries the pool generation, so an id kept after `remove_sledge` never
/// aliases a sledge allocated later in the same slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SledgeId(pub(crate) Handle);

/// Caller-chosen identity of an external sprite.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpriteId(pub u64);

/// Identity of a scheduled sprite timeout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeoutId(pub u64);

/// Separating axis of a hit or crossing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    #[default]
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn of(self, v: DVec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    #[inline]
    pub(crate) fn set(self, v: &mut DVec2, value: f64) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }
}

/// Solved contact between two sledges, before ids are attached.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HitTime {
    /// Absolute simulation time of the contact.
    pub time: f64,
    pub axis: Axis,
    /// The pair was already interpenetrating when the contact was solved.
    pub overlapping: bool,
}

/// Predicted collision between two sledges.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Hit {
    pub time: f64,
    pub axis: Axis,
    pub overlapping: bool,
    pub a: SledgeId,
    pub b: SledgeId,
}

impl Hit {
    pub fn new(a: SledgeId, b: SledgeId, hit: HitTime) -> Self {
        Self { time: hit.time, axis: hit.axis, overlapping: hit.overlapping, a, b }
    }

    /// Contact time if the pair meets across a vertical edge.
    pub fn x_time(&self) -> Option<f64> {
        (self.axis == Axis::X).then_some(self.time)
    }

    /// Contact time if the pair meets across a horizontal edge.
    pub fn y_time(&self) -> Option<f64> {
        (self.axis == Axis::Y).then_some(self.time)
    }

    /// True when `id` is one of the two participants.
    pub fn involves(&self, id: SledgeId) -> bool {
        self.a == id || self.b == id
    }
}

/// Predicted time a sledge's leading edge enters the next cell along `axis`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CellEntryEvent {
    pub time: f64,
    pub axis: Axis,
    pub sledge: SledgeId,
}

/// A sprite-owned alarm dispatched through [`Sprite::on_timeout`](crate::Sprite::on_timeout).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Timeout {
    pub id: TimeoutId,
    pub sprite: SpriteId,
    pub time: f64,
    /// Opaque value chosen by the sprite when scheduling.
    pub tag: u64,
}

/// Collision payload handed to hit callbacks, expressed in sprite ids.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpriteHit {
    pub sprite1: SpriteId,
    pub sprite2: SpriteId,
    pub time: f64,
    pub x_time: Option<f64>,
    pub y_time: Option<f64>,
    pub overlapping: bool,
}

/// Grid and scheduler configuration.
#[derive(Clone, Debug)]
pub struct GridConfig {
    /// Grid cell size in world units.
    pub cell_size: f64,
    /// Added on every side of a bounding box before converting it to a cell range.
    /// Sledges straddling a cell wall within this distance are registered on both sides.
    pub padding: f64,
    /// How far past `now` a synthesized hit for an already-overlapping pair is scheduled.
    pub overlap_lead: f64,
    /// Expected number of pending events per queue; sizes the skip-list levels.
    pub expected_queue_len: usize,
    /// Seed for the skip-list level generator.
    pub seed: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            padding: 1e-3,
            overlap_lead: 1e-3,
            expected_queue_len: 1024,
            seed: 0x5eed,
        }
    }
}

impl GridConfig {
    pub fn with_cell_size(cell_size: f64) -> Self {
        Self { cell_size, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(PhysicsError::InvalidConfig("cell_size must be finite and positive"));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(PhysicsError::InvalidConfig("padding must be finite and non-negative"));
        }
        if !(self.overlap_lead.is_finite() && self.overlap_lead > 0.0) {
            return Err(PhysicsError::InvalidConfig("overlap_lead must be finite and positive"));
        }
        if self.expected_queue_len == 0 {
            return Err(PhysicsError::InvalidConfig("expected_queue_len must be non-zero"));
        }
        Ok(())
    }
}

/// Debug statistics for the scheduler.
#[derive(Copy, Clone, Debug, Default)]
pub struct GridStats {
    pub cells: usize,
    pub sledges: usize,
    /// Sum of bucket lengths, stale entries included.
    pub bucket_entries: usize,
    pub pending_hits: usize,
    pub pending_cell_entries: usize,
}
