//! Time-ordered skip list used for pending hits, cell crossings and timeouts.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::pool::{Handle, Pool};
use crate::types::{CellEntryEvent, Hit, Timeout};

/// Anything that can be scheduled.
pub trait Timed {
    fn time(&self) -> f64;
}

impl Timed for Hit {
    fn time(&self) -> f64 {
        self.time
    }
}

impl Timed for CellEntryEvent {
    fn time(&self) -> f64 {
        self.time
    }
}

impl Timed for Timeout {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Hard cap on tower height; 2^32 pending events is far beyond any scene.
pub const MAX_LEVELS: usize = 32;

type Links = [Option<Handle>; MAX_LEVELS];

#[derive(Debug)]
struct Node<T> {
    value: T,
    next: Links,
    level: usize,
}

/// Min-queue ordered by [`Timed::time`], backed by a skip list.
///
/// Equal times are all kept; a node is spliced after existing nodes with the
/// same time. Node storage is recycled through a [`Pool`], so once warm the
/// queue does not allocate.
#[derive(Debug)]
pub struct SkipQueue<T> {
    nodes: Pool<Node<T>>,
    head: Links,
    max_level: usize,
    len: usize,
    rng: SmallRng,
}

/// `ceil(log2(expected_len))`, clamped to `1..=MAX_LEVELS`.
pub fn max_level_for(expected_len: usize) -> usize {
    let n = expected_len.max(1);
    let ceil_log2 = (usize::BITS - (n - 1).leading_zeros()) as usize;
    ceil_log2.clamp(1, MAX_LEVELS)
}

impl<T: Timed + Copy> SkipQueue<T> {
    pub fn with_expected_len(expected_len: usize, seed: u64) -> Self {
        Self {
            nodes: Pool::with_capacity(expected_len.min(256)),
            head: [None; MAX_LEVELS],
            max_level: max_level_for(expected_len),
            len: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.random_bool(0.5) {
            level += 1;
        }
        level
    }

    /// Successor of `at` on `level`; `None` for `at` means the head tower.
    fn next_of(&self, at: Option<Handle>, level: usize) -> Option<Handle> {
        match at {
            None => self.head[level],
            Some(h) => self.nodes[h].next[level],
        }
    }

    fn set_next(&mut self, at: Option<Handle>, level: usize, to: Option<Handle>) {
        match at {
            None => self.head[level] = to,
            Some(h) => self.nodes[h].next[level] = to,
        }
    }

    pub fn add(&mut self, value: T) {
        let time = value.time();
        debug_assert!(!time.is_nan(), "scheduled a NaN time");

        let mut update: Links = [None; MAX_LEVELS];
        let mut cur: Option<Handle> = None;
        for level in (0..self.max_level).rev() {
            while let Some(next) = self.next_of(cur, level) {
                if self.nodes[next].value.time() > time {
                    break;
                }
                cur = Some(next);
            }
            update[level] = cur;
        }

        let level = self.random_level();
        let node = self.nodes.insert(Node { value, next: [None; MAX_LEVELS], level });
        for (l, &pred) in update.iter().enumerate().take(level) {
            let succ = self.next_of(pred, l);
            self.nodes[node].next[l] = succ;
            self.set_next(pred, l, Some(node));
        }
        self.len += 1;
    }

    /// The minimum-time entry, left in place.
    pub fn first(&self) -> Option<&T> {
        self.head[0].map(|h| &self.nodes[h].value)
    }

    pub fn first_time(&self) -> Option<f64> {
        self.first().map(Timed::time)
    }

    pub fn remove_first(&mut self) -> Option<T> {
        let h = self.head[0]?;
        let node = &self.nodes[h];
        let value = node.value;
        // The minimum heads every level its tower reaches.
        for l in 0..node.level {
            debug_assert_eq!(self.head[l], Some(h));
            self.head[l] = node.next[l];
        }
        self.nodes.free(h);
        self.len -= 1;
        Some(value)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = [None; MAX_LEVELS];
        self.len = 0;
    }

    /// Entries in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let mut cur = self.head[0];
        std::iter::from_fn(move || {
            let h = cur?;
            let node = &self.nodes[h];
            cur = node.next[0];
            Some(&node.value)
        })
    }
}
