use glam::{DVec2, IVec2};

use crate::error::Result;
use crate::physics::Physics;
use crate::raycast::RayScan;
use crate::sledge::Sledge;
use crate::types::*;

/// Public API contract for the broad-phase scheduler.
pub trait SchedulerApi {
    // --- Membership --------------------------------------------------------

    /// Register a sledge, schedule its hits against co-resident sledges and
    /// its first cell crossings. The sledge is moved to the clock's `now`.
    fn add_sledge_in_group(&mut self, sledge: Sledge, group: Group) -> SledgeId;

    /// Free a sledge. Grid buckets keep the stale id until next encountered.
    fn remove_sledge(&mut self, id: SledgeId) -> Result<Sledge>;

    // --- Scheduling --------------------------------------------------------

    /// Earliest valid hit strictly before `before`, left queued.
    ///
    /// Cell crossings earlier than that hit are consumed along the way, which
    /// is how grid membership follows moving sledges.
    fn get_next_collision_before_time(&mut self, before: f64) -> Result<Option<Hit>>;

    /// Like [`get_next_collision_before_time`](Self::get_next_collision_before_time)
    /// but removes the returned hit from the queue.
    fn take_next_collision_before_time(&mut self, before: f64) -> Result<Option<Hit>>;

    // --- Queries -----------------------------------------------------------

    /// Earliest sledge in a group colliding with `group` touched by the
    /// (possibly thick) segment. Results are written into `scan`; returns
    /// whether anything was hit.
    fn ray_scan(&mut self, scan: &mut RayScan, group: Group) -> bool;
}

/// External object bound to at most one sledge by [`Physics`].
pub trait Sprite: Sized {
    fn id(&self) -> SpriteId;

    fn group(&self) -> Group;

    /// Build this sprite's collision proxy as of `now`, or `None` for no collision shape.
    fn create_sledge(&self, now: f64) -> Option<Sledge>;

    /// A timeout scheduled through [`Physics::add_timeout`] came due.
    fn on_timeout(&mut self, _timeout: &Timeout, _physics: &mut Physics<Self>) {}

    /// Called for both participants when no global hit callback is registered.
    fn on_sprite_hit(&mut self, _other: SpriteId, _hit: &SpriteHit, _physics: &mut Physics<Self>) {}
}

/// Visualization breadcrumbs emitted by the grid when a sink is installed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DebugMark {
    /// A cell examined by a ray scan.
    RayCell(IVec2),
    /// Where a ray scan stopped on a sledge.
    RayHit { pos: DVec2, sledge: SledgeId },
    /// A sledge registered into a newly entered cell.
    CellEntry { sledge: SledgeId, cell: IVec2 },
}

pub trait DebugSink {
    fn mark(&mut self, mark: DebugMark);
}

impl DebugSink for Vec<DebugMark> {
    fn mark(&mut self, mark: DebugMark) {
        self.push(mark);
    }
}
