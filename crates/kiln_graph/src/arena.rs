//! Slot storage for graph nodes.
//!
//! The loader cache and the finished [`Graph`](crate::graph::Graph) share one
//! [`Arena`]: freezing the cache moves the arena, so every [`NodeId`] issued
//! during loading stays valid afterwards.
//!
//! [`NodeId`]: crate::ids::NodeId

use std::marker::PhantomData;
use std::ops::Index;

/// A key that addresses one slot of an [`Arena`].
pub trait ArenaId: Copy {
    /// Wraps a slot index.
    fn from_index(index: usize) -> Self;

    /// Returns the slot index.
    fn index(self) -> usize;
}

/// Append-only slots addressed by `I`.
///
/// Slots are never removed. A slot's value can be swapped with
/// [`replace`](Arena::replace), which is how the cache upserts a node without
/// invalidating edges that already point at it.
#[derive(Debug, Clone)]
pub struct Arena<I, T> {
    slots: Vec<T>,
    _key: PhantomData<fn() -> I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates an arena with no slots.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            _key: PhantomData,
        }
    }

    /// Stores `value` in a new slot.
    pub fn alloc(&mut self, value: T) -> I {
        let id = I::from_index(self.slots.len());
        self.slots.push(value);
        id
    }

    /// Swaps the value in slot `id`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    pub fn replace(&mut self, id: I, value: T) -> T {
        std::mem::replace(&mut self.slots[id.index()], value)
    }

    /// Returns the value in slot `id`, if it exists.
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.index())
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing was allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over `(id, value)` in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, value)| (I::from_index(index), value))
    }

    /// Iterates over values in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

/// Indexing panics on an ID from another arena.
impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.slots[id.index()]
    }
}
