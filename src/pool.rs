//! Free-list backed object pools.
//!
//! Every short-lived record the scheduler churns through (sledges, queue nodes)
//! lives in a [`Pool`]. Slots are recycled through a free-index stack, so a warm
//! pool stops allocating. Handles carry a generation: once a slot is freed its
//! old handle reads as absent, even after the slot is reused.

use std::ops::{Index, IndexMut};

/// Generational index into a [`Pool`]. The default handle is never live.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    live: bool,
}

#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity), free: Vec::new(), live: 0 }
    }

    /// Store `value` in a recycled slot if one is free, else in a new one.
    pub fn insert(&mut self, value: T) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(!slot.live, "free list handed out a live slot");
            slot.value = value;
            slot.live = true;
            return Handle { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { value, generation: 1, live: true });
        Handle { index, generation: 1 }
    }

    /// Release the slot behind `handle`. Returns false for stale handles.
    ///
    /// The value is left in place until the slot is reused; it is unreachable
    /// through any handle from then on.
    pub fn free(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if !slot.live || slot.generation != handle.generation {
            return false;
        }
        slot.live = false;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        self.free.push(handle.index);
        self.live -= 1;
        true
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        (slot.live && slot.generation == handle.generation).then_some(&slot.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        (slot.live && slot.generation == handle.generation).then_some(&mut slot.value)
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total slots ever created, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Free every live slot, keeping storage for reuse.
    pub fn clear(&mut self) {
        let handles: Vec<Handle> = self.iter().map(|(h, _)| h).collect();
        for h in handles {
            self.free(h);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter(|(_, s)| s.live).map(|(i, s)| {
            (Handle { index: i as u32, generation: s.generation }, &s.value)
        })
    }
}

impl<T: Default> Pool<T> {
    /// Allocate a slot holding `T::default()`.
    ///
    /// Recycled slots are always reset; nothing from a previous owner survives.
    pub fn alloc(&mut self) -> Handle {
        self.insert(T::default())
    }
}

impl<T> Index<Handle> for Pool<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        match self.get(handle) {
            Some(v) => v,
            None => panic!("stale pool handle {handle:?}"),
        }
    }
}

impl<T> IndexMut<Handle> for Pool<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.get_mut(handle) {
            Some(v) => v,
            None => panic!("stale pool handle {handle:?}"),
        }
    }
}
