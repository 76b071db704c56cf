//! Slots and handles.
//!
//! A slot is either occupied by a record or a tombstone. Its generation is
//! bumped every time the slot is retired, so a handle taken before the
//! retirement no longer resolves once the slot is reused.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Names one incarnation of a record in an `EntityTable<T>`.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index, i.e. the record's table ID.
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}g{}", self.index, self.generation)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub(crate) generation: u32,
    /// Occupancy marker. `Some` only once the record is fully built.
    pub(crate) value: Option<T>,
}

impl<T> Slot<T> {
    pub(crate) fn occupied(&self) -> bool {
        self.value.is_some()
    }
}
