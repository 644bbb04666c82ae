//! Moving axis-aligned rectangles and their closed-form hit times.

use glam::{DVec2, IVec2};

use crate::geom::{CellRange, solve_sweep, step_of};
use crate::types::{Axis, Group, HitTime};

/// A moving axis-aligned rectangle used as a collision proxy.
///
/// Position is never integrated: [`move_to_time`](Sledge::move_to_time)
/// recomputes it from the origin captured at construction (or at the last
/// velocity change), so arbitrary jumps back and forth in time do not drift.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sledge {
    /// Center as of `t`.
    pub pos: DVec2,
    pub t: f64,
    pub vel: DVec2,
    /// Half-extents `(rx, ry)`.
    pub half: DVec2,
    /// Predictions at or beyond this time are discarded.
    pub expiration: f64,
    pub group: Group,

    origin: DVec2,
    origin_t: f64,

    // Broad-phase cache, owned by the grid once registered.
    pub(crate) dir: IVec2,
    pub(crate) cell_period: DVec2,
    pub(crate) next_cross: DVec2,
    pub(crate) front_cell: IVec2,
}

impl Default for Sledge {
    fn default() -> Self {
        Self::new(DVec2::ZERO, DVec2::ZERO, DVec2::ZERO, 0.0, 0.0)
    }
}

impl Sledge {
    pub fn new(pos: DVec2, vel: DVec2, half: DVec2, t: f64, expiration: f64) -> Self {
        let mut sledge = Self {
            pos,
            t,
            vel,
            half,
            expiration,
            group: 0,
            origin: pos,
            origin_t: t,
            dir: IVec2::ZERO,
            cell_period: DVec2::INFINITY,
            next_cross: DVec2::INFINITY,
            front_cell: IVec2::ZERO,
        };
        sledge.reset_cache();
        sledge
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = group;
        self
    }

    /// Center at time `t`, without moving the sledge.
    #[inline]
    pub fn position_at(&self, t: f64) -> DVec2 {
        self.origin + self.vel * (t - self.origin_t)
    }

    #[inline]
    pub fn move_to_time(&mut self, t: f64) {
        self.pos = self.position_at(t);
        self.t = t;
    }

    /// Replace the velocity from the sledge's current instant onwards.
    pub fn reset_velocity(&mut self, vel: DVec2) {
        self.origin = self.pos;
        self.origin_t = self.t;
        self.vel = vel;
        self.reset_cache();
    }

    /// Replace the half-extents, keeping center and motion.
    pub fn reset_half_extents(&mut self, half: DVec2) {
        self.half = half;
        self.reset_cache();
    }

    pub(crate) fn reset_cache(&mut self) {
        self.dir = IVec2::new(step_of(self.vel.x), step_of(self.vel.y));
        self.cell_period = DVec2::INFINITY;
        self.next_cross = DVec2::INFINITY;
        self.front_cell = IVec2::ZERO;
    }

    /// `(min, max)` corners at the current `t`.
    pub fn bounds(&self) -> (DVec2, DVec2) {
        (self.pos - self.half, self.pos + self.half)
    }

    pub fn is_valid_at(&self, t: f64) -> bool {
        t < self.expiration
    }

    /// Padded cell range covered at the current `t`.
    pub(crate) fn cell_range(&self, cell_size: f64, padding: f64) -> CellRange {
        CellRange::from_box(self.pos, self.half, cell_size, padding)
    }

    /// Earliest time at or after `now` when `self` and `other` touch.
    ///
    /// Both sledges are moved to `now`. A pair already interpenetrating gets an
    /// `overlapping` hit `overlap_lead` after `now`. Hits at or past either
    /// sledge's expiration are dropped.
    pub fn calc_hit_time(&mut self, other: &mut Sledge, now: f64, overlap_lead: f64) -> Option<HitTime> {
        self.move_to_time(now);
        other.move_to_time(now);
        let radius = self.half + other.half;
        let (dt, axis, overlapping) =
            solve_sweep(other.pos - self.pos, other.vel - self.vel, radius, overlap_lead)?;
        let time = now + dt;
        if time >= self.expiration.min(other.expiration) {
            return None;
        }
        Some(HitTime { time, axis, overlapping })
    }

    /// Per-axis cell-crossing period (`cell_size / |v|`), infinite when still.
    pub(crate) fn init_cell_period(&mut self, cell_size: f64) {
        let period = |v: f64| if v == 0.0 { f64::INFINITY } else { cell_size / v.abs() };
        self.cell_period = DVec2::new(period(self.vel.x), period(self.vel.y));
    }

    /// Time the padded leading edge reaches the far wall of the front cell on `axis`.
    pub(crate) fn first_crossing(&self, axis: Axis, cell_size: f64, padding: f64) -> Option<f64> {
        let (pos, half, vel, dir, front) = match axis {
            Axis::X => (self.pos.x, self.half.x, self.vel.x, self.dir.x, self.front_cell.x),
            Axis::Y => (self.pos.y, self.half.y, self.vel.y, self.dir.y, self.front_cell.y),
        };
        if dir == 0 {
            return None;
        }
        let edge = pos + f64::from(dir) * (half + padding);
        let wall = if dir > 0 { f64::from(front + 1) * cell_size } else { f64::from(front) * cell_size };
        let dt = ((wall - edge) / vel).max(0.0);
        Some(self.t + dt)
    }
}
