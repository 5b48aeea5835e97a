use alloc::vec::Vec;

use super::handle::Handle;
use crate::error::{Error, Result};

/// Slot table owning every node of a tree.
///
/// Freed slots go on a free list and are handed out again before the table grows.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an arena able to hold `capacity` elements without reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity > Handle::MAX {
            return Err(Error::CapacityOverflow {
                requested: capacity,
                max: Handle::MAX,
            });
        }
        let mut arena = Self::new();
        arena.slots.try_reserve_exact(capacity).map_err(|_| Error::OutOfMemory)?;
        Ok(arena)
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Guarantees that the next `additional` calls to [`Arena::alloc`] neither reallocate nor panic.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let needed = additional.saturating_sub(self.free.len());
        if self.slots.len() + needed > Handle::MAX {
            return Err(Error::OutOfMemory);
        }
        self.slots.try_reserve(needed).map_err(|_| Error::OutOfMemory)
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    /// Drops every element at once. Capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
