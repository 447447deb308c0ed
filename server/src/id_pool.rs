//! Bounded pool of player slot ids.
//!
//! Connection tasks acquire ids without blocking; the game task releases them
//! once a departed player's trail has been cleared from the grid.

use crate::grid::PlayerId;
use log::warn;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug)]
struct Slots {
    free: VecDeque<PlayerId>,
    outstanding: HashSet<PlayerId>,
}

/// Hands out ids `1..=capacity`, lowest first on a fresh pool and in release
/// order afterwards.
#[derive(Debug)]
pub struct IdPool {
    capacity: usize,
    slots: Mutex<Slots>,
}

impl IdPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(PlayerId::MAX as usize);
        Self {
            capacity,
            slots: Mutex::new(Slots {
                free: (1..=capacity as PlayerId).collect(),
                outstanding: HashSet::new(),
            }),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes a free id, or `None` when every slot is in use.
    pub fn acquire(&self) -> Option<PlayerId> {
        let mut slots = self.slots();
        let id = slots.free.pop_front()?;
        slots.outstanding.insert(id);
        Some(id)
    }

    /// Returns an id to the pool.
    ///
    /// The caller must have cleared every grid cell owned by `id`. Releasing
    /// an id that is not outstanding is logged and ignored.
    pub fn release(&self, id: PlayerId) -> bool {
        let mut slots = self.slots();
        if !slots.outstanding.remove(&id) {
            warn!("Ignoring release of id {} which is not in use", id);
            return false;
        }
        slots.free.push_back(id);
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots().free.len()
    }

    pub fn in_use(&self) -> usize {
        self.slots().outstanding.len()
    }
}
