use glam::IVec2;

use std::collections::{HashMap, HashSet};

use crate::api::{DebugMark, DebugSink, SchedulerApi};
use crate::clock::SimClock;
use crate::error::{PhysicsError, Result};
use crate::geom::pack_cell_key;
use crate::pool::Pool;
use crate::queue::SkipQueue;
use crate::raycast::{self, RayScan};
use crate::sledge::Sledge;
use crate::types::*;

/// One grid cell: a swap-remove bag of sledge ids per collision group.
#[derive(Debug, Default)]
struct GridCell {
    buckets: Vec<Vec<SledgeId>>,
}

/// Sparse uniform grid that schedules hits and cell crossings in time order.
///
/// Membership is lazy in both directions. A moving sledge is added to the
/// cells its leading edge enters, one crossing event at a time, and is never
/// taken out of the cells it leaves. Removed sledges stay in buckets until a
/// reader trips over them; every reader checks liveness first.
pub struct CellGrid {
    cfg: GridConfig,
    clock: SimClock,

    // group -> groups it collides with
    adjacency: Vec<Vec<Group>>,
    cells: HashMap<u64, GridCell>,
    sledges: Pool<Sledge>,

    hits: SkipQueue<Hit>,
    entries: SkipQueue<CellEntryEvent>,
    // Pairs with a hit in `hits`, so co-residency in several cells schedules it once.
    pending_pairs: HashSet<(SledgeId, SledgeId)>,

    debug: Option<Box<dyn DebugSink>>,
}

fn pair_key(a: SledgeId, b: SledgeId) -> (SledgeId, SledgeId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Symmetric adjacency from a flat pair list; a group may pair with itself.
fn build_adjacency(group_pairs: &[(Group, Group)]) -> Vec<Vec<Group>> {
    let mut adjacency: Vec<Vec<Group>> = Vec::new();
    let link = |adj: &mut Vec<Vec<Group>>, from: Group, to: Group| {
        if adj.len() <= from {
            adj.resize_with(from + 1, Vec::new);
        }
        if !adj[from].contains(&to) {
            adj[from].push(to);
        }
    };
    for &(a, b) in group_pairs {
        link(&mut adjacency, a, b);
        link(&mut adjacency, b, a);
    }
    adjacency
}

impl CellGrid {
    pub fn new(cfg: GridConfig, group_pairs: &[(Group, Group)], clock: SimClock) -> Result<Self> {
        cfg.validate()?;
        let adjacency = build_adjacency(group_pairs);
        Ok(Self {
            hits: SkipQueue::with_expected_len(cfg.expected_queue_len, cfg.seed),
            entries: SkipQueue::with_expected_len(cfg.expected_queue_len, cfg.seed.rotate_left(17)),
            cfg,
            clock,
            adjacency,
            cells: HashMap::new(),
            sledges: Pool::new(),
            pending_pairs: HashSet::new(),
            debug: None,
        })
    }

    /// Install a sink receiving ray-scan and cell-entry marks.
    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.debug = Some(sink);
        self
    }

    pub fn take_debug_sink(&mut self) -> Option<Box<dyn DebugSink>> {
        self.debug.take()
    }

    pub fn config(&self) -> &GridConfig {
        &self.cfg
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Groups that `group` is checked against.
    pub fn colliding_groups(&self, group: Group) -> &[Group] {
        self.adjacency.get(group).map_or(&[][..], Vec::as_slice)
    }

    pub fn groups_collide(&self, a: Group, b: Group) -> bool {
        self.colliding_groups(a).contains(&b)
    }

    pub fn sledge(&self, id: SledgeId) -> Option<&Sledge> {
        self.sledges.get(id.0)
    }

    pub fn contains(&self, id: SledgeId) -> bool {
        self.sledges.contains(id.0)
    }

    /// Number of live sledges.
    pub fn len(&self) -> usize {
        self.sledges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sledges.is_empty()
    }

    /// Raw bucket contents, stale ids included.
    pub(crate) fn bucket(&self, cell: IVec2, group: Group) -> &[SledgeId] {
        self.cells
            .get(&pack_cell_key(cell))
            .and_then(|c| c.buckets.get(group))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Live sledges registered in `cell`, any group.
    pub fn sledges_in_cell(&self, cell: IVec2) -> impl Iterator<Item = SledgeId> + '_ {
        self.cells
            .get(&pack_cell_key(cell))
            .into_iter()
            .flat_map(|c| c.buckets.iter().flatten().copied())
            .filter(|id| self.sledges.contains(id.0))
    }

    /// Return debug/perf stats for the current grid.
    pub fn stats(&self) -> GridStats {
        GridStats {
            cells: self.cells.len(),
            sledges: self.sledges.len(),
            bucket_entries: self.cells.values().flat_map(|c| c.buckets.iter()).map(Vec::len).sum(),
            pending_hits: self.hits.len(),
            pending_cell_entries: self.entries.len(),
        }
    }

    /// Register `id` in `cell`, scheduling hits against everything already there.
    ///
    /// Hits are solved from `at`, which is `now` for fresh sledges and the
    /// crossing time for cell entries.
    fn add_to_cell(&mut self, id: SledgeId, cell: IVec2, at: f64) {
        let Self { cells, sledges, hits, pending_pairs, adjacency, cfg, .. } = self;
        let mut me = sledges[id.0];
        let group = me.group;
        let grid_cell = cells.entry(pack_cell_key(cell)).or_default();

        for &other_group in adjacency.get(group).map_or(&[][..], Vec::as_slice) {
            let Some(bucket) = grid_cell.buckets.get_mut(other_group) else {
                continue;
            };
            let mut i = 0;
            while i < bucket.len() {
                let other_id = bucket[i];
                if other_id == id {
                    i += 1;
                    continue;
                }
                let Some(other) = sledges.get(other_id.0) else {
                    log::trace!("pruning stale {other_id:?} from cell {cell}");
                    bucket.swap_remove(i);
                    continue;
                };
                let key = pair_key(id, other_id);
                if !pending_pairs.contains(&key) {
                    let mut other = *other;
                    if let Some(hit) = me.calc_hit_time(&mut other, at, cfg.overlap_lead) {
                        log::trace!("hit {id:?} x {other_id:?} at {}", hit.time);
                        hits.add(Hit::new(id, other_id, hit));
                        pending_pairs.insert(key);
                    }
                }
                i += 1;
            }
        }

        if grid_cell.buckets.len() <= group {
            grid_cell.buckets.resize_with(group + 1, Vec::new);
        }
        let bucket = &mut grid_cell.buckets[group];
        if !bucket.contains(&id) {
            bucket.push(id);
        }
    }

    fn schedule_crossing(&mut self, id: SledgeId, axis: Axis, time: f64) {
        let sledge = &mut self.sledges[id.0];
        if !time.is_finite() || time >= sledge.expiration {
            axis.set(&mut sledge.next_cross, f64::INFINITY);
            return;
        }
        axis.set(&mut sledge.next_cross, time);
        self.entries.add(CellEntryEvent { time, axis, sledge: id });
    }

    /// Consume one crossing: advance the front cell and join the new row or column.
    fn enter_next_cell(&mut self, ev: CellEntryEvent) -> Result<()> {
        let now = self.clock.now();
        if ev.time < now {
            return Err(PhysicsError::TimeRegression { time: ev.time, now });
        }
        let (cell_size, padding) = (self.cfg.cell_size, self.cfg.padding);
        let sledge = &mut self.sledges[ev.sledge.0];
        sledge.move_to_time(ev.time);
        let range = sledge.cell_range(cell_size, padding);
        let entered: Vec<IVec2> = match ev.axis {
            Axis::X => {
                sledge.front_cell.x += sledge.dir.x;
                let ix = sledge.front_cell.x;
                (range.min.y..=range.max.y).map(|iy| IVec2::new(ix, iy)).collect()
            }
            Axis::Y => {
                sledge.front_cell.y += sledge.dir.y;
                let iy = sledge.front_cell.y;
                (range.min.x..=range.max.x).map(|ix| IVec2::new(ix, iy)).collect()
            }
        };
        let next = ev.time + ev.axis.of(sledge.cell_period);

        log::debug!("{:?} crosses on {:?} at {}", ev.sledge, ev.axis, ev.time);
        for cell in entered {
            if let Some(sink) = self.debug.as_mut() {
                sink.mark(DebugMark::CellEntry { sledge: ev.sledge, cell });
            }
            self.add_to_cell(ev.sledge, cell, ev.time);
        }
        self.schedule_crossing(ev.sledge, ev.axis, next);
        Ok(())
    }

    /// Drop queue heads that reference freed sledges or superseded crossings.
    ///
    /// A live hit behind `now` means the clock was moved past it; that is a
    /// time regression, same as for crossings.
    fn discard_stale(&mut self) -> Result<()> {
        let now = self.clock.now();
        while let Some(hit) = self.hits.first() {
            let live = self.sledges.contains(hit.a.0) && self.sledges.contains(hit.b.0);
            if live {
                if hit.time < now {
                    return Err(PhysicsError::TimeRegression { time: hit.time, now });
                }
                break;
            }
            let hit = *hit;
            self.hits.remove_first();
            self.pending_pairs.remove(&pair_key(hit.a, hit.b));
        }
        while let Some(ev) = self.entries.first() {
            let current = self
                .sledges
                .get(ev.sledge.0)
                .is_some_and(|s| ev.axis.of(s.next_cross) == ev.time);
            if current {
                break;
            }
            self.entries.remove_first();
        }
        Ok(())
    }
}

impl SchedulerApi for CellGrid {
    fn add_sledge_in_group(&mut self, mut sledge: Sledge, group: Group) -> SledgeId {
        let now = self.clock.now();
        let (cell_size, padding) = (self.cfg.cell_size, self.cfg.padding);

        sledge.group = group;
        sledge.move_to_time(now);
        sledge.reset_cache();
        sledge.init_cell_period(cell_size);
        let range = sledge.cell_range(cell_size, padding);
        sledge.front_cell = IVec2::new(
            if sledge.dir.x < 0 { range.min.x } else { range.max.x },
            if sledge.dir.y < 0 { range.min.y } else { range.max.y },
        );
        let first_x = sledge.first_crossing(Axis::X, cell_size, padding);
        let first_y = sledge.first_crossing(Axis::Y, cell_size, padding);

        let id = SledgeId(self.sledges.insert(sledge));
        for cell in range.iter() {
            self.add_to_cell(id, cell, now);
        }
        if let Some(t) = first_x {
            self.schedule_crossing(id, Axis::X, t);
        }
        if let Some(t) = first_y {
            self.schedule_crossing(id, Axis::Y, t);
        }
        log::debug!("added {id:?} in group {group} over cells {:?}..={:?}", range.min, range.max);
        id
    }

    fn remove_sledge(&mut self, id: SledgeId) -> Result<Sledge> {
        let sledge = *self.sledges.get(id.0).ok_or(PhysicsError::UnknownSledge(id))?;
        self.sledges.free(id.0);
        log::debug!("removed {id:?}");
        Ok(sledge)
    }

    fn get_next_collision_before_time(&mut self, before: f64) -> Result<Option<Hit>> {
        loop {
            self.discard_stale()?;
            let hit_time = self.hits.first_time();
            match self.entries.first_time() {
                // Crossings go first on ties so the hits they uncover are not missed.
                Some(t) if t < before && hit_time.is_none_or(|h| t <= h) => {
                    if let Some(ev) = self.entries.remove_first() {
                        self.enter_next_cell(ev)?;
                    }
                }
                _ => {
                    return Ok(self.hits.first().filter(|h| h.time < before).copied());
                }
            }
        }
    }

    fn take_next_collision_before_time(&mut self, before: f64) -> Result<Option<Hit>> {
        let next = self.get_next_collision_before_time(before)?;
        if let Some(hit) = next {
            self.hits.remove_first();
            self.pending_pairs.remove(&pair_key(hit.a, hit.b));
        }
        Ok(next)
    }

    fn ray_scan(&mut self, scan: &mut RayScan, group: Group) -> bool {
        match self.debug.take() {
            Some(mut sink) => {
                raycast::scan(self, scan, group, Some(sink.as_mut()));
                self.debug = Some(sink);
            }
            None => raycast::scan(self, scan, group, None),
        }
        scan.hit_sledge.is_some()
    }
}
