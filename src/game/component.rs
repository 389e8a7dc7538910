//! Slot Storage
//!
//! `SlotStorage<T>` is a sparse array indexed by a handle's slot. The
//! manager keeps its root objects here; the handle allocator decides which
//! slots are live, this type only holds the data.

use super::entity::MoHandle;

/// Sparse storage keyed by `MoHandle::index()`.
pub struct SlotStorage<T> {
    data: Vec<Option<T>>,
}

impl<T> SlotStorage<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn ensure_capacity(&mut self, index: usize) {
        if index >= self.data.len() {
            self.data.resize_with(index + 1, || None);
        }
    }

    /// Insert a value for a handle, replacing any existing one.
    pub fn insert(&mut self, handle: MoHandle, value: T) {
        let idx = handle.index() as usize;
        self.ensure_capacity(idx);
        self.data[idx] = Some(value);
    }

    /// Remove and return the value in a handle's slot.
    pub fn remove(&mut self, handle: MoHandle) -> Option<T> {
        self.data.get_mut(handle.index() as usize).and_then(|slot| slot.take())
    }

    pub fn get(&self, handle: MoHandle) -> Option<&T> {
        self.data.get(handle.index() as usize).and_then(|opt| opt.as_ref())
    }

    pub fn get_mut(&mut self, handle: MoHandle) -> Option<&mut T> {
        self.data.get_mut(handle.index() as usize).and_then(|opt| opt.as_mut())
    }

    pub fn contains(&self, handle: MoHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterate over all (slot, value) pairs.
    /// Slots carry no generation; check liveness through the allocator.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(idx, opt)| opt.as_ref().map(|c| (idx as u32, c)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, opt)| opt.as_mut().map(|c| (idx as u32, c)))
    }

    pub fn clear(&mut self) {
        for slot in &mut self.data {
            *slot = None;
        }
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|opt| opt.is_some()).count()
    }
}

impl<T> Default for SlotStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}
