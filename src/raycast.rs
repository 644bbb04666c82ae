//! Thick-segment ray scans over the cell grid.

use glam::DVec2;

use std::collections::HashSet;

use crate::api::{DebugMark, DebugSink};
use crate::geom::{CellRange, cell_of, pack_cell_key, solve_sweep, step_of};
use crate::grid::CellGrid;
use crate::sledge::Sledge;
use crate::types::{Axis, Group, SledgeId};

/// In-out record for [`SchedulerApi::ray_scan`](crate::SchedulerApi::ray_scan).
///
/// The probe is a box of `half_extents` swept from `from` to `to`; hit times
/// are fractions of that segment in `[0, 1]`. Reuse one record across scans
/// to avoid allocating per query.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RayScan {
    pub from: DVec2,
    pub to: DVec2,
    /// Zero for a thin ray.
    pub half_extents: DVec2,

    pub hit_time: Option<f64>,
    pub hit_sledge: Option<SledgeId>,
    /// `None` when the probe starts inside the sledge it hit.
    pub hit_axis: Option<Axis>,
}

impl RayScan {
    pub fn new(from: DVec2, to: DVec2) -> Self {
        Self { from, to, ..Self::default() }
    }

    pub fn thick(from: DVec2, to: DVec2, half_extents: DVec2) -> Self {
        Self { from, to, half_extents, ..Self::default() }
    }

    /// Re-aim the probe and forget the previous result.
    pub fn reset(&mut self, from: DVec2, to: DVec2) {
        *self = Self { from, to, half_extents: self.half_extents, ..Self::default() };
    }

    pub fn clear_hit(&mut self) {
        self.hit_time = None;
        self.hit_sledge = None;
        self.hit_axis = None;
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> DVec2 {
        self.from + (self.to - self.from) * t
    }

    /// Probe center at the hit.
    pub fn hit_pos(&self) -> Option<DVec2> {
        self.hit_time.map(|t| self.point_at(t))
    }
}

/// Swept probe against a target frozen at `now`.
///
/// The mirror image of `Sledge::calc_hit_time`: the probe moves with
/// velocity `to - from` over one time unit and the target stands still.
fn sweep_target(ray: &RayScan, target: &Sledge, now: f64) -> Option<(f64, Option<Axis>)> {
    let rel = target.position_at(now) - ray.from;
    let radius = target.half + ray.half_extents;
    let gap = rel.abs();
    // Starting on the surface counts as inside.
    if gap.x <= radius.x && gap.y <= radius.y {
        return Some((0.0, None));
    }
    // The probe is not overlapping, so the overlap lead is never used.
    let (t, axis, _) = solve_sweep(rel, -(ray.to - ray.from), radius, f64::INFINITY)?;
    (t <= 1.0).then_some((t, Some(axis)))
}

/// Walk the cells under the probe, nearest first, and record the earliest hit.
pub(crate) fn scan(grid: &CellGrid, ray: &mut RayScan, group: Group, mut sink: Option<&mut dyn DebugSink>) {
    ray.clear_hit();
    let colliders = grid.colliding_groups(group);
    if colliders.is_empty() {
        return;
    }
    let now = grid.now();
    let cfg = grid.config();
    let (cs, pad) = (cfg.cell_size, cfg.padding);
    let d = ray.to - ray.from;
    let reach = ray.half_extents + DVec2::splat(pad);

    // DDA along the centre line, as in a thin raycast.
    let step_x = step_of(d.x);
    let step_y = step_of(d.y);
    let next_boundary = |c: i32, step: i32| -> f64 {
        if step > 0 { f64::from(c + 1) * cs } else { f64::from(c) * cs }
    };
    let start = (cell_of(ray.from.x, cs), cell_of(ray.from.y, cs));
    let mut t_max_x = if step_x != 0 { (next_boundary(start.0, step_x) - ray.from.x) / d.x } else { f64::INFINITY };
    let mut t_max_y = if step_y != 0 { (next_boundary(start.1, step_y) - ray.from.y) / d.y } else { f64::INFINITY };
    let t_delta_x = if step_x != 0 { cs / d.x.abs() } else { f64::INFINITY };
    let t_delta_y = if step_y != 0 { cs / d.y.abs() } else { f64::INFINITY };

    let mut visited: HashSet<u64> = HashSet::new();
    let mut tested: HashSet<SledgeId> = HashSet::new();
    let mut best: Option<(f64, SledgeId, Option<Axis>)> = None;
    let mut t_enter = 0.0f64;

    loop {
        let t_exit = t_max_x.min(t_max_y).min(1.0);

        // Tail range: everything the thick probe can touch during [t_enter, t_exit].
        let p0 = ray.point_at(t_enter);
        let p1 = ray.point_at(t_exit);
        let range = CellRange::from_bounds(p0.min(p1) - reach, p0.max(p1) + reach, cs);
        for cell in range.iter() {
            if !visited.insert(pack_cell_key(cell)) {
                continue;
            }
            if let Some(sink) = sink.as_deref_mut() {
                sink.mark(DebugMark::RayCell(cell));
            }
            for &g in colliders {
                for &id in grid.bucket(cell, g) {
                    if !tested.insert(id) {
                        continue;
                    }
                    let Some(target) = grid.sledge(id) else {
                        continue;
                    };
                    if !target.is_valid_at(now) {
                        continue;
                    }
                    if let Some((t, axis)) = sweep_target(ray, target, now) {
                        if best.is_none_or(|(bt, _, _)| t < bt) {
                            best = Some((t, id, axis));
                        }
                    }
                }
            }
        }

        // Cells reached later cannot hold anything touched before t_exit.
        if best.is_some_and(|(bt, _, _)| bt <= t_exit) || t_exit >= 1.0 {
            break;
        }
        if t_max_x < t_max_y {
            t_enter = t_max_x;
            t_max_x += t_delta_x;
        } else {
            t_enter = t_max_y;
            t_max_y += t_delta_y;
        }
    }

    if let Some((t, id, axis)) = best {
        ray.hit_time = Some(t);
        ray.hit_sledge = Some(id);
        ray.hit_axis = axis;
        if let Some(sink) = sink {
            sink.mark(DebugMark::RayHit { pos: ray.point_at(t), sledge: id });
        }
    }
}
