//! Sprite-level coordinator: binds sprites to sledges and runs the event loop.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::api::{DebugSink, SchedulerApi, Sprite};
use crate::clock::SimClock;
use crate::error::{PhysicsError, Result};
use crate::grid::CellGrid;
use crate::queue::SkipQueue;
use crate::raycast::RayScan;
use crate::sledge::Sledge;
use crate::types::*;

/// Global hit handler; replaces the per-sprite [`Sprite::on_sprite_hit`] calls.
pub type HitCallback<S> = Box<dyn FnMut(&mut Physics<S>, &SpriteHit)>;

/// Owns the sprites, their sledges and their timeouts, and advances time.
///
/// Sprites never touch the grid directly. Geometry changes are reported with
/// [`mark_dirty`](Physics::mark_dirty) and applied in one batch before the
/// next query: every dirty sprite loses its sledge, then gets a fresh one from
/// [`Sprite::create_sledge`] at the current time.
///
/// While one of its handlers runs, a sprite is checked out of the coordinator:
/// [`sprite`](Physics::sprite) returns `None` for it and it cannot be removed.
pub struct Physics<S: Sprite> {
    grid: CellGrid,
    clock: SimClock,

    sprites: HashMap<SpriteId, S>,
    sprite_to_sledge: HashMap<SpriteId, SledgeId>,
    sledge_to_sprite: HashMap<SledgeId, SpriteId>,
    dirty: BTreeSet<SpriteId>,

    timeouts: SkipQueue<Timeout>,
    // Cancelled timeouts stay queued but drop out of this set.
    live_timeouts: HashSet<TimeoutId>,
    next_timeout: u64,

    on_hit: Option<HitCallback<S>>,
    busy: Option<SpriteId>,
    dispatching: bool,
}

impl<S: Sprite> Physics<S> {
    pub fn new(cfg: GridConfig, group_pairs: &[(Group, Group)], clock: SimClock) -> Result<Self> {
        let timeouts = SkipQueue::with_expected_len(cfg.expected_queue_len, cfg.seed.rotate_left(41));
        let grid = CellGrid::new(cfg, group_pairs, clock.clone())?;
        Ok(Self {
            grid,
            clock,
            sprites: HashMap::new(),
            sprite_to_sledge: HashMap::new(),
            sledge_to_sprite: HashMap::new(),
            dirty: BTreeSet::new(),
            timeouts,
            live_timeouts: HashSet::new(),
            next_timeout: 0,
            on_hit: None,
            busy: None,
            dispatching: false,
        })
    }

    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.grid = self.grid.with_debug_sink(sink);
        self
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn sim_clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Registered sprites, the one running a handler included.
    pub fn len(&self) -> usize {
        self.sprites.len() + usize::from(self.busy.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&S> {
        self.sprites.get(&id)
    }

    /// Mutable access marks nothing dirty; call [`mark_dirty`](Self::mark_dirty) after moving it.
    pub fn sprite_mut(&mut self, id: SpriteId) -> Option<&mut S> {
        self.sprites.get_mut(&id)
    }

    /// The sledge currently standing in for `id`, if it has one.
    pub fn sledge_of(&self, id: SpriteId) -> Option<&Sledge> {
        self.sprite_to_sledge.get(&id).and_then(|&s| self.grid.sledge(s))
    }

    pub fn sledge_id_of(&self, id: SpriteId) -> Option<SledgeId> {
        self.sprite_to_sledge.get(&id).copied()
    }

    pub fn sprite_of_sledge(&self, id: SledgeId) -> Option<SpriteId> {
        self.sledge_to_sprite.get(&id).copied()
    }

    fn is_registered(&self, id: SpriteId) -> bool {
        self.busy == Some(id) || self.sprites.contains_key(&id)
    }

    /// Register a sprite. Its sledge is built on the next batch update.
    pub fn add_sprite(&mut self, sprite: S) -> Result<SpriteId> {
        let id = sprite.id();
        if self.is_registered(id) {
            return Err(PhysicsError::DuplicateSprite(id));
        }
        self.sprites.insert(id, sprite);
        self.dirty.insert(id);
        log::trace!("added sprite {id:?}");
        Ok(id)
    }

    /// Unregister a sprite, dropping its sledge and its pending timeouts.
    pub fn remove_sprite(&mut self, id: SpriteId) -> Result<S> {
        if self.busy == Some(id) {
            return Err(PhysicsError::SpriteInUse(id));
        }
        let sprite = self.sprites.remove(&id).ok_or(PhysicsError::UnknownSprite(id))?;
        self.unbind(id)?;
        self.dirty.remove(&id);
        let stale: Vec<TimeoutId> = self.timeouts.iter().filter(|t| t.sprite == id).map(|t| t.id).collect();
        for timeout in stale {
            self.live_timeouts.remove(&timeout);
        }
        log::trace!("removed sprite {id:?}");
        Ok(sprite)
    }

    /// Schedule the sprite's sledge for rebuilding. Unknown ids are ignored at rebuild time.
    pub fn mark_dirty(&mut self, id: SpriteId) {
        self.dirty.insert(id);
    }

    fn unbind(&mut self, id: SpriteId) -> Result<()> {
        if let Some(sledge) = self.sprite_to_sledge.remove(&id) {
            self.sledge_to_sprite.remove(&sledge);
            self.grid.remove_sledge(sledge)?;
        }
        Ok(())
    }

    /// Rebuild the sledges of every dirty sprite: all removals first, then all creations.
    ///
    /// A sprite running a handler stays dirty until it is checked back in.
    pub fn update_sledges(&mut self) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let mut dirty = std::mem::take(&mut self.dirty);
        if let Some(busy) = self.busy {
            if dirty.remove(&busy) {
                self.dirty.insert(busy);
            }
        }
        log::debug!("rebuilding {} sledges at {}", dirty.len(), self.now());

        for &id in &dirty {
            self.unbind(id)?;
        }
        let now = self.now();
        for id in dirty {
            let Some(sprite) = self.sprites.get(&id) else {
                continue;
            };
            let group = sprite.group();
            if let Some(sledge) = sprite.create_sledge(now) {
                let sledge_id = self.grid.add_sledge_in_group(sledge, group);
                self.sprite_to_sledge.insert(id, sledge_id);
                self.sledge_to_sprite.insert(sledge_id, id);
            }
        }
        Ok(())
    }

    pub fn set_on_sprite_hit<F>(&mut self, f: F)
    where
        F: FnMut(&mut Physics<S>, &SpriteHit) + 'static,
    {
        self.on_hit = Some(Box::new(f));
    }

    /// Call `on_timeout` on `sprite` after `delay`; `tag` comes back in the [`Timeout`].
    pub fn add_timeout(&mut self, sprite: SpriteId, delay: f64, tag: u64) -> Result<TimeoutId> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(PhysicsError::InvalidTime(delay));
        }
        if !self.is_registered(sprite) {
            return Err(PhysicsError::UnknownSprite(sprite));
        }
        let id = TimeoutId(self.next_timeout);
        self.next_timeout += 1;
        self.timeouts.add(Timeout { id, sprite, time: self.now() + delay, tag });
        self.live_timeouts.insert(id);
        Ok(id)
    }

    /// Returns false if the timeout already fired or was cancelled.
    pub fn cancel_timeout(&mut self, id: TimeoutId) -> bool {
        self.live_timeouts.remove(&id)
    }

    pub fn pending_timeouts(&self) -> usize {
        self.live_timeouts.len()
    }

    fn discard_stale_timeouts(&mut self) {
        while let Some(timeout) = self.timeouts.first() {
            if self.live_timeouts.contains(&timeout.id) {
                break;
            }
            self.timeouts.remove_first();
        }
    }

    /// Advance time by `duration`, dispatching every hit and timeout before the end in order.
    ///
    /// On a tie a hit goes before a timeout. The clock ends at exactly
    /// `start + duration`; events at that instant are left for the next call.
    pub fn clock(&mut self, duration: f64) -> Result<()> {
        if self.dispatching {
            return Err(PhysicsError::Reentrant);
        }
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(PhysicsError::InvalidTime(duration));
        }
        let end = self.now() + duration;
        self.dispatching = true;
        let result = self.run_until(end);
        self.dispatching = false;
        result?;
        self.clock.advance_to(end)
    }

    fn run_until(&mut self, end: f64) -> Result<()> {
        loop {
            self.update_sledges()?;
            self.discard_stale_timeouts();
            let hit = self.grid.get_next_collision_before_time(end)?;
            let timeout_time = self.timeouts.first_time().filter(|&t| t < end);
            match (hit, timeout_time) {
                (Some(hit), t) if t.is_none_or(|t| hit.time <= t) => {
                    self.grid.take_next_collision_before_time(end)?;
                    self.clock.advance_to(hit.time)?;
                    self.dispatch_hit(&hit);
                }
                (_, Some(_)) => {
                    let Some(timeout) = self.timeouts.remove_first() else {
                        continue;
                    };
                    self.live_timeouts.remove(&timeout.id);
                    self.clock.advance_to(timeout.time)?;
                    log::trace!("timeout {:?} for {:?} at {}", timeout.id, timeout.sprite, timeout.time);
                    self.with_sprite(timeout.sprite, |sprite, physics| sprite.on_timeout(&timeout, physics));
                }
                _ => return Ok(()),
            }
        }
    }

    fn dispatch_hit(&mut self, hit: &Hit) {
        let (Some(sprite1), Some(sprite2)) = (self.sprite_of_sledge(hit.a), self.sprite_of_sledge(hit.b)) else {
            log::trace!("hit {:?} x {:?} has no sprites", hit.a, hit.b);
            return;
        };
        let sprite_hit = SpriteHit {
            sprite1,
            sprite2,
            time: hit.time,
            x_time: hit.x_time(),
            y_time: hit.y_time(),
            overlapping: hit.overlapping,
        };
        log::trace!("hit {sprite1:?} x {sprite2:?} at {}", hit.time);

        if let Some(mut on_hit) = self.on_hit.take() {
            on_hit(self, &sprite_hit);
            // A callback installed from inside the handler wins.
            if self.on_hit.is_none() {
                self.on_hit = Some(on_hit);
            }
        } else {
            self.with_sprite(sprite1, |sprite, physics| sprite.on_sprite_hit(sprite2, &sprite_hit, physics));
            self.with_sprite(sprite2, |sprite, physics| sprite.on_sprite_hit(sprite1, &sprite_hit, physics));
        }
    }

    /// Check `id` out for the duration of `f`. Does nothing if it is gone.
    fn with_sprite(&mut self, id: SpriteId, f: impl FnOnce(&mut S, &mut Self)) {
        let Some(mut sprite) = self.sprites.remove(&id) else {
            return;
        };
        self.busy = Some(id);
        f(&mut sprite, self);
        self.busy = None;
        self.sprites.insert(id, sprite);
    }

    /// Earliest sprite whose sledge the (possibly thick) segment touches.
    pub fn ray_scan(&mut self, scan: &mut RayScan, group: Group) -> Result<Option<SpriteId>> {
        self.update_sledges()?;
        if !self.grid.ray_scan(scan, group) {
            return Ok(None);
        }
        Ok(scan.hit_sledge.and_then(|s| self.sprite_of_sledge(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Hit { me: SpriteId, other: SpriteId, time: f64 },
        Timeout { me: SpriteId, tag: u64, time: f64 },
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    /// Moves in a straight line and stops dead on its first hit.
    struct Mover {
        id: SpriteId,
        group: Group,
        origin: DVec2,
        t0: f64,
        vel: DVec2,
        half: DVec2,
        solid: bool,
        // Keeps its velocity through hits.
        pushy: bool,
        log: Log,
    }

    impl Mover {
        fn new(id: u64, x: f64, y: f64, vx: f64, half: f64, log: &Log) -> Self {
            Self {
                id: SpriteId(id),
                group: 0,
                origin: DVec2::new(x, y),
                t0: 0.0,
                vel: DVec2::new(vx, 0.0),
                half: DVec2::splat(half),
                solid: true,
                pushy: false,
                log: log.clone(),
            }
        }

        fn in_group(mut self, group: Group) -> Self {
            self.group = group;
            self
        }

        fn stop(&mut self, at: f64) {
            self.origin += self.vel * (at - self.t0);
            self.t0 = at;
            self.vel = DVec2::ZERO;
        }
    }

    impl Sprite for Mover {
        fn id(&self) -> SpriteId {
            self.id
        }

        fn group(&self) -> Group {
            self.group
        }

        fn create_sledge(&self, now: f64) -> Option<Sledge> {
            if !self.solid {
                return None;
            }
            let pos = self.origin + self.vel * (now - self.t0);
            Some(Sledge::new(pos, self.vel, self.half, now, f64::INFINITY))
        }

        fn on_timeout(&mut self, timeout: &Timeout, physics: &mut Physics<Self>) {
            self.log.borrow_mut().push(Event::Timeout { me: self.id, tag: timeout.tag, time: timeout.time });
            match timeout.tag {
                // Repeating alarm.
                1 => {
                    physics.add_timeout(self.id, 2.0, 1).unwrap();
                }
                42 => {
                    assert_eq!(physics.remove_sprite(self.id).err(), Some(PhysicsError::SpriteInUse(self.id)));
                    assert!(physics.sprite(self.id).is_none());
                }
                _ => {}
            }
        }

        fn on_sprite_hit(&mut self, other: SpriteId, hit: &SpriteHit, physics: &mut Physics<Self>) {
            assert_eq!(physics.now(), hit.time);
            self.log.borrow_mut().push(Event::Hit { me: self.id, other, time: hit.time });
            if !self.pushy {
                self.stop(hit.time);
            }
            physics.mark_dirty(self.id);
        }
    }

    fn physics(cell_size: f64) -> Physics<Mover> {
        let cfg = GridConfig { cell_size, ..GridConfig::default() };
        Physics::new(cfg, &[(0, 0), (0, 1)], SimClock::new()).unwrap()
    }

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_head_on_pair_hits_at_45() {
        let log = log();
        let mut p = physics(32.0);
        let a = p.add_sprite(Mover::new(1, 0.0, 0.0, 1.0, 5.0, &log)).unwrap();
        let b = p.add_sprite(Mover::new(2, 100.0, 0.0, -1.0, 5.0, &log)).unwrap();
        p.clock(100.0).unwrap();
        assert_eq!(p.now(), 100.0);

        let events = log.borrow();
        assert_eq!(events.len(), 2, "{events:?}");
        // The sledge that found the hit is reported first: b, on entering a's cell.
        let Event::Hit { me, other, time } = events[0] else {
            panic!("expected a hit, got {:?}", events[0]);
        };
        assert_eq!((me, other), (b, a));
        assert!((time - 45.0).abs() < 1e-9, "{time}");
        assert!(matches!(events[1], Event::Hit { me, other, .. } if me == a && other == b));

        // Both stopped where they touched.
        let sa = p.sledge_of(a).unwrap();
        let sb = p.sledge_of(b).unwrap();
        assert_eq!(sa.vel, DVec2::ZERO);
        assert!((sb.pos.x - sa.pos.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle_clock_advances_exactly_and_calls_nothing() {
        let log = log();
        let mut p = physics(32.0);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        p.set_on_sprite_hit(move |_, _| counter.set(counter.get() + 1));
        p.add_sprite(Mover::new(1, 0.0, 0.0, 0.0, 5.0, &log)).unwrap();
        p.add_sprite(Mover::new(2, 100.0, 0.0, 0.0, 5.0, &log)).unwrap();

        p.clock(2.5).unwrap();
        assert_eq!(p.now(), 2.5);
        p.clock(0.1).unwrap();
        assert_eq!(p.now(), 2.5 + 0.1);
        p.clock(0.0).unwrap();
        assert_eq!(p.now(), 2.5 + 0.1);
        assert_eq!(calls.get(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_global_callback_replaces_sprite_handlers() {
        let log = log();
        let mut p = physics(1000.0);
        let seen: Rc<RefCell<Vec<SpriteHit>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        p.set_on_sprite_hit(move |physics, hit| {
            assert_eq!(physics.now(), hit.time);
            assert!(physics.sprite(hit.sprite1).is_some());
            sink.borrow_mut().push(*hit);
            // Stop both so the pair is reported once.
            for id in [hit.sprite1, hit.sprite2] {
                physics.sprite_mut(id).unwrap().stop(hit.time);
                physics.mark_dirty(id);
            }
        });
        p.add_sprite(Mover::new(1, 0.0, 0.0, 1.0, 5.0, &log)).unwrap();
        p.add_sprite(Mover::new(2, 100.0, 0.0, -1.0, 5.0, &log)).unwrap();
        p.clock(100.0).unwrap();

        assert!(log.borrow().is_empty());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].time, 45.0);
        assert_eq!(seen[0].x_time, Some(45.0));
        assert_eq!(seen[0].y_time, None);
        assert!(!seen[0].overlapping);
    }

    #[test]
    fn test_hits_and_timeouts_interleave_in_time_order() {
        let log = log();
        let mut p = physics(1000.0);
        let a = p.add_sprite(Mover::new(1, 0.0, 0.0, 1.0, 5.0, &log)).unwrap();
        let b = p.add_sprite(Mover::new(2, 100.0, 0.0, -1.0, 5.0, &log)).unwrap();
        p.add_timeout(b, 50.0, 8).unwrap();
        p.add_timeout(a, 10.0, 7).unwrap();
        // Ties with the hit, which goes first.
        p.add_timeout(a, 45.0, 9).unwrap();
        let cancelled = p.add_timeout(a, 20.0, 99).unwrap();
        assert!(p.cancel_timeout(cancelled));
        assert!(!p.cancel_timeout(cancelled));
        assert_eq!(p.pending_timeouts(), 3);

        p.clock(100.0).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Timeout { me: a, tag: 7, time: 10.0 },
                // b joined the grid after a, so it owns the hit.
                Event::Hit { me: b, other: a, time: 45.0 },
                Event::Hit { me: a, other: b, time: 45.0 },
                Event::Timeout { me: a, tag: 9, time: 45.0 },
                Event::Timeout { me: b, tag: 8, time: 50.0 },
            ]
        );
        assert_eq!(p.pending_timeouts(), 0);
    }

    #[test]
    fn test_timeouts_can_reschedule_from_handler() {
        let log = log();
        let mut p = physics(32.0);
        let a = p.add_sprite(Mover::new(1, 0.0, 0.0, 0.0, 1.0, &log)).unwrap();
        p.add_timeout(a, 2.0, 1).unwrap();
        p.clock(7.0).unwrap();
        let times: Vec<f64> = log
            .borrow()
            .iter()
            .map(|e| match e {
                Event::Timeout { time, .. } => *time,
                Event::Hit { .. } => panic!("unexpected hit"),
            })
            .collect();
        assert_eq!(times, vec![2.0, 4.0, 6.0]);
        // The alarm due at 8 is still pending.
        assert_eq!(p.pending_timeouts(), 1);
    }

    #[test]
    fn test_sprite_cannot_remove_itself_from_handler() {
        let log = log();
        let mut p = physics(32.0);
        let a = p.add_sprite(Mover::new(1, 0.0, 0.0, 0.0, 1.0, &log)).unwrap();
        p.add_timeout(a, 1.0, 42).unwrap();
        p.clock(2.0).unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert!(p.sprite(a).is_some());
    }

    #[test]
    fn test_dirty_sprites_rebuild_once_per_batch() {
        let log = log();
        let mut p = physics(32.0);
        let a = p.add_sprite(Mover::new(1, 0.0, 0.0, 0.0, 1.0, &log)).unwrap();
        let mut ghost = Mover::new(2, 50.0, 0.0, 0.0, 1.0, &log);
        ghost.solid = false;
        let g = p.add_sprite(ghost).unwrap();
        assert!(p.sledge_of(a).is_none());

        p.update_sledges().unwrap();
        let first = p.sledge_id_of(a).unwrap();
        assert!(p.sledge_of(g).is_none());
        assert_eq!(p.grid().len(), 1);

        p.sprite_mut(a).unwrap().half = DVec2::splat(3.0);
        p.mark_dirty(a);
        p.mark_dirty(a);
        // Unknown ids are skipped.
        p.mark_dirty(SpriteId(77));
        p.update_sledges().unwrap();
        let second = p.sledge_id_of(a).unwrap();
        assert_ne!(first, second);
        assert!(!p.grid().contains(first));
        assert_eq!(p.sledge_of(a).unwrap().half, DVec2::splat(3.0));
        assert_eq!(p.sprite_of_sledge(second), Some(a));
        assert_eq!(p.grid().len(), 1);
    }

    #[test]
    fn test_removed_sprite_gets_no_hits_or_timeouts() {
        let log = log();
        let mut p = physics(1000.0);
        let a = p.add_sprite(Mover::new(1, 0.0, 0.0, 1.0, 5.0, &log)).unwrap();
        let b = p.add_sprite(Mover::new(2, 100.0, 0.0, -1.0, 5.0, &log)).unwrap();
        p.update_sledges().unwrap();
        p.add_timeout(b, 5.0, 3).unwrap();

        let removed = p.remove_sprite(b).unwrap();
        assert_eq!(removed.id, b);
        assert!(p.sledge_of(b).is_none());
        assert_eq!(p.remove_sprite(b).err(), Some(PhysicsError::UnknownSprite(b)));
        assert_eq!(p.add_sprite(Mover::new(1, 0.0, 0.0, 0.0, 1.0, &log)).err(), Some(PhysicsError::DuplicateSprite(a)));
        assert_eq!(p.add_timeout(b, 1.0, 0).err(), Some(PhysicsError::UnknownSprite(b)));

        // Same id again, far away: the old timeout must not fire for it.
        p.add_sprite(Mover::new(2, 5000.0, 0.0, 0.0, 5.0, &log)).unwrap();
        p.clock(100.0).unwrap();
        assert!(log.borrow().is_empty(), "{:?}", log.borrow());
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_ray_scan_reports_sprites() {
        let log = log();
        let mut p = physics(32.0);
        let target = p.add_sprite(Mover::new(5, 30.0, 0.0, 0.0, 5.0, &log).in_group(1)).unwrap();
        let mut ray = RayScan::new(DVec2::ZERO, DVec2::new(100.0, 0.0));
        assert_eq!(p.ray_scan(&mut ray, 0).unwrap(), Some(target));
        assert_eq!(ray.hit_time, Some(0.25));
        ray.reset(DVec2::ZERO, DVec2::new(0.0, 100.0));
        assert_eq!(p.ray_scan(&mut ray, 0).unwrap(), None);
    }

    #[test]
    fn test_pushing_into_a_wall_keeps_time_moving() {
        let log = log();
        let cfg = GridConfig { cell_size: 1000.0, overlap_lead: 0.5, ..GridConfig::default() };
        let mut p: Physics<Mover> = Physics::new(cfg, &[(0, 0)], SimClock::new()).unwrap();
        let mut pusher = Mover::new(1, 0.0, 0.0, 1.0, 5.0, &log);
        pusher.pushy = true;
        let a = p.add_sprite(pusher).unwrap();
        p.add_sprite(Mover::new(2, 20.0, 0.0, 0.0, 5.0, &log)).unwrap();

        p.clock(20.0).unwrap();
        assert_eq!(p.now(), 20.0);
        let times: Vec<f64> = log
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Hit { me, time, .. } if me == a => Some(time),
                _ => None,
            })
            .collect();
        // Touching at 10, then one overlapping hit per lead while still pushing in.
        let expected: Vec<f64> = (0..20).map(|i| 10.0 + 0.5 * f64::from(i)).collect();
        assert_eq!(times, expected);
    }

    #[test]
    fn test_clock_rejects_bad_durations_and_reentry() {
        let log = log();
        let mut p = physics(1000.0);
        assert_eq!(p.clock(-1.0), Err(PhysicsError::InvalidTime(-1.0)));
        assert!(p.clock(f64::NAN).is_err());
        assert_eq!(p.now(), 0.0);

        let nested = Rc::new(Cell::new(false));
        let flag = nested.clone();
        p.set_on_sprite_hit(move |physics, hit| {
            flag.set(physics.clock(1.0) == Err(PhysicsError::Reentrant));
            for id in [hit.sprite1, hit.sprite2] {
                physics.sprite_mut(id).unwrap().stop(hit.time);
                physics.mark_dirty(id);
            }
        });
        p.add_sprite(Mover::new(1, 0.0, 0.0, 1.0, 5.0, &log)).unwrap();
        p.add_sprite(Mover::new(2, 20.0, 0.0, 0.0, 5.0, &log)).unwrap();
        p.clock(20.0).unwrap();
        assert!(nested.get());
        assert_eq!(p.now(), 20.0);
    }
}
