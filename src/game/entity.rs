//! Object identity
//!
//! Two kinds of identity live side by side:
//! - `UniqueId`: assigned once when an object is built, never reused for
//!   the life of the process (or the world that hands them out).
//! - `MoHandle`: generational index into the object manager's root slots.
//!   A handle to a destroyed object stops resolving even after its slot is
//!   reused, so held references are always liveness-checked.

use std::fmt;

use serde::{Serialize, Deserialize};

/// Monotonic object id, unique for the lifetime of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId(u64);

impl UniqueId {
    /// Never handed out by `UniqueIds`.
    pub const NONE: UniqueId = UniqueId(0);

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        UniqueId::NONE
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out `UniqueId`s. Owned by the simulation world and passed to
/// whatever constructs objects.
#[derive(Debug)]
pub struct UniqueIds {
    next: u64,
}

impl UniqueIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> UniqueId {
        let id = UniqueId(self.next);
        self.next += 1;
        id
    }

    /// How many ids have been issued so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for UniqueIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Generational reference to a root object held by the manager.
///
/// Consists of a slot index and the generation of that slot. Two handles
/// with the same index but different generations name different objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoHandle {
    /// Slot in the manager's storage
    index: u32,
    /// Generation counter - increments when slot is reused
    generation: u32,
}

impl MoHandle {
    /// Should only be called by `HandleAllocator`.
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// A handle that never resolves.
    pub const NULL: MoHandle = MoHandle { index: u32::MAX, generation: 0 };

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for MoHandle {
    fn default() -> Self {
        MoHandle::NULL
    }
}

/// Allocates and tracks handle lifetimes.
///
/// Freed slots are reused with an incremented generation so stale handles
/// stop resolving.
pub struct HandleAllocator {
    /// Generation counter for each slot
    generations: Vec<u32>,
    /// Free slots available for reuse (LIFO)
    free_indices: Vec<u32>,
    /// Next fresh index if no free slots available
    next_fresh: u32,
    /// Number of currently live handles
    alive_count: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_indices: Vec::new(),
            next_fresh: 0,
            alive_count: 0,
        }
    }

    pub fn allocate(&mut self) -> MoHandle {
        self.alive_count += 1;

        if let Some(index) = self.free_indices.pop() {
            // Generation was already bumped on free
            MoHandle::new(index, self.generations[index as usize])
        } else {
            let index = self.next_fresh;
            self.next_fresh += 1;
            self.generations.push(0);
            MoHandle::new(index, 0)
        }
    }

    /// Free a handle, making its slot available for reuse.
    /// Returns true if the handle was live and is now freed.
    pub fn free(&mut self, handle: MoHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }

        self.generations[handle.index as usize] += 1;
        self.free_indices.push(handle.index);
        self.alive_count -= 1;
        true
    }

    pub fn is_alive(&self, handle: MoHandle) -> bool {
        if handle.is_null() {
            return false;
        }
        let idx = handle.index as usize;
        idx < self.generations.len() && self.generations[idx] == handle.generation
    }

    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// Current handle for a slot index, whether or not it is live.
    pub fn handle_at(&self, index: u32) -> Option<MoHandle> {
        self.generations
            .get(index as usize)
            .map(|&generation| MoHandle::new(index, generation))
    }

    /// Invalidate every handle and make all slots free.
    pub fn clear(&mut self) {
        for gen in &mut self.generations {
            *gen += 1;
        }
        self.free_indices.clear();
        self.free_indices.extend((0..self.next_fresh).rev());
        self.alive_count = 0;
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_are_monotonic() {
        let mut ids = UniqueIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert!(!a.is_none());
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_allocate_and_free() {
        let mut alloc = HandleAllocator::new();

        let h1 = alloc.allocate();
        let h2 = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);

        alloc.free(h1);
        assert_eq!(alloc.alive_count(), 1);
        assert!(!alloc.is_alive(h1));
        assert!(alloc.is_alive(h2));
        assert!(!alloc.free(h1));
    }

    #[test]
    fn test_generation_prevents_reuse_collision() {
        let mut alloc = HandleAllocator::new();

        let h1 = alloc.allocate();
        alloc.free(h1);

        let h2 = alloc.allocate();
        assert_eq!(h2.index(), h1.index());
        assert_ne!(h2.generation(), h1.generation());
        assert!(!alloc.is_alive(h1));
        assert!(alloc.is_alive(h2));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut alloc = HandleAllocator::new();
        let h = alloc.allocate();
        alloc.clear();
        assert!(!alloc.is_alive(h));
        assert_eq!(alloc.alive_count(), 0);
        // Slot 0 comes back first
        assert_eq!(alloc.allocate().index(), 0);
    }

    #[test]
    fn test_null_handle() {
        let alloc = HandleAllocator::new();
        assert!(!alloc.is_alive(MoHandle::NULL));
        assert!(MoHandle::default().is_null());
    }
}
