//! # Entity Tables
//!
//! Fixed-capacity, ID-indexed record storage used for every entity kind.
//!
//! ## Layout
//! - Slots are appended up to `capacity` and never move or compact.
//! - A retired slot becomes a tombstone; the next `insert` reuses the lowest
//!   tombstone before appending past the high-water mark.
//! - Each slot carries a generation, so a `Handle` resolves only to the
//!   record incarnation it was issued for.
//! - `push` treats the table as a ring instead: it appends until the table is
//!   full, then wraps to slot 0 and keeps writing over tombstones in slot
//!   order. Ring order is write order, which `rfind_within` walks backwards.
//!   A table is used either as a ring or through `insert`, never both.
//!
//! Lookups are linear scans over the high-water range. The tables stay small
//! enough (tens of thousands of entries) that the scan beats keeping a
//! secondary index in sync with recycling.

pub mod slot;
pub mod types;

pub use slot::Handle;
pub use types::TableStats;

use crate::error::{StoreError, StoreResult};
use log::error;
use slot::Slot;

#[derive(Debug)]
pub struct EntityTable<T> {
    name: &'static str,
    capacity: usize,
    slots: Vec<Slot<T>>,
    live: usize,
    /// Slot the next `push` writes to
    cursor: usize,
}

impl<T> EntityTable<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            slots: Vec::new(),
            live: 0,
            cursor: 0,
        }
    }

    // ============================================================================================
    // ACCESSORS
    // ============================================================================================

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots ever handed out.
    pub fn high_water(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Whether the next `push` has a slot to write to.
    pub fn can_push(&self) -> bool {
        match self.slots.get(self.cursor) {
            Some(slot) => !slot.occupied(),
            None => self.cursor < self.capacity && self.cursor < u32::MAX as usize,
        }
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            name: self.name,
            capacity: self.capacity,
            high_water: self.slots.len(),
            live: self.live,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Handle of the record currently living at `index`, if any.
    pub fn handle_at(&self, index: usize) -> Option<Handle<T>> {
        self.slots
            .get(index)
            .filter(|slot| slot.occupied())
            .map(|slot| Handle::new(index, slot.generation))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::new(idx, slot.generation), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (Handle::new(idx, generation), value))
        })
    }

    // ============================================================================================
    // LOOKUP
    // ============================================================================================

    /// First live record, in ID order, satisfying `pred`.
    pub fn find<F>(&self, mut pred: F) -> Option<Handle<T>>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().find(|(_, value)| pred(value)).map(|(h, _)| h)
    }

    /// Scan backwards in ring order from the most recently pushed slot,
    /// looking at no more than `window` slots. Records further back are
    /// reported as absent even if they match.
    pub fn rfind_within<F>(&self, window: usize, mut pred: F) -> Option<Handle<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let len = self.slots.len();
        let newest = self.cursor + len;
        (1..=window.min(len)).find_map(|back| {
            let idx = (newest - back) % len;
            let slot = &self.slots[idx];
            match slot.value.as_ref() {
                Some(value) if pred(value) => Some(Handle::new(idx, slot.generation)),
                _ => None,
            }
        })
    }

    // ============================================================================================
    // MUTATION
    // ============================================================================================

    /// Store `value` in the lowest tombstone, or append if there is none.
    pub fn insert(&mut self, value: T) -> StoreResult<Handle<T>> {
        match self.slots.iter().position(|slot| !slot.occupied()) {
            Some(idx) => {
                let slot = &mut self.slots[idx];
                // Occupancy is the last field written
                slot.value = Some(value);
                self.live += 1;
                Ok(Handle::new(idx, slot.generation))
            }
            None => self.push(value),
        }
    }

    /// Write `value` at the ring cursor: past the high-water mark until the
    /// table is full, then over tombstones from slot 0 onwards. A live record
    /// at the cursor means the ring has caught up with its oldest entry.
    pub fn push(&mut self, value: T) -> StoreResult<Handle<T>> {
        if !self.can_push() {
            error!("Table {} is full ({} slots)", self.name, self.capacity);
            return Err(self.exhausted());
        }
        let idx = self.cursor;
        let generation = match self.slots.get_mut(idx) {
            Some(slot) => {
                slot.value = Some(value);
                slot.generation
            }
            None => {
                if self.slots.try_reserve(1).is_err() {
                    error!("Table {} could not grow past {} slots", self.name, idx);
                    return Err(self.exhausted());
                }
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                0
            }
        };
        self.live += 1;
        self.cursor = if idx + 1 >= self.capacity { 0 } else { idx + 1 };
        Ok(Handle::new(idx, generation))
    }

    /// Tombstone the record behind `handle` and return it.
    ///
    /// The generation moves on before the occupancy marker is cleared, so
    /// the old handle stops resolving no later than the record disappears.
    pub fn retire(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() || !slot.occupied() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        let value = slot.value.take();
        self.live -= 1;
        value
    }

    fn exhausted(&self) -> StoreError {
        StoreError::ResourceExhausted {
            what: self.name,
            capacity: self.capacity,
        }
    }
}
