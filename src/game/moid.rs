//! MOID registration
//!
//! Every frame the world renumbers all hit-detectable objects from scratch.
//! The index position is the MOID; slot 0 is reserved for "no object". A
//! root and its attached subtree occupy a contiguous run of slots, so
//! "does pixel owner X belong to root Y" is a range check on Y's footprint.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::preset::ObjectKind;
use super::entity::UniqueId;
use super::movable::MovableObject;

/// Per-frame object id. Only meaningful until the next registration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Moid(u32);

impl Moid {
    /// No object / not registered this frame
    pub const NONE: Moid = Moid(0);

    pub const fn new(raw: u32) -> Self {
        Moid(raw)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Moid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moid:{}", self.0)
    }
}

/// What the index remembers about the object in a slot. Non-owning: the
/// object is found again through the manager by its unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoidEntry {
    pub unique_id: UniqueId,
    /// Unique id of the top of the attachment chain
    pub root_id: UniqueId,
    pub team: Option<u8>,
    pub kind: ObjectKind,
}

/// Frame-scoped MOID -> object table.
#[derive(Debug)]
pub struct MoidIndex {
    slots: Vec<Option<MoidEntry>>,
}

impl MoidIndex {
    pub fn new() -> Self {
        Self { slots: vec![None] }
    }

    /// Drop every registration, keeping the reserved slot 0.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
    }

    /// Number of slots including the reserved one.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing but the reserved slot is present.
    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    pub fn get(&self, moid: Moid) -> Option<&MoidEntry> {
        self.slots.get(moid.index()).and_then(|e| e.as_ref())
    }

    /// Unique id of the root object owning `moid`.
    pub fn root_of(&self, moid: Moid) -> Option<UniqueId> {
        self.get(moid).map(|e| e.root_id)
    }

    fn push(&mut self, entry: MoidEntry) -> Moid {
        self.slots.push(Some(entry));
        Moid((self.slots.len() - 1) as u32)
    }

    /// The most recently appended slot, if any object has registered.
    fn last(&self) -> Option<Moid> {
        if self.is_empty() {
            None
        } else {
            Some(Moid((self.slots.len() - 1) as u32))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Moid, &MoidEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (Moid(i as u32), e)))
    }
}

impl Default for MoidIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Objects that take part in pixel hit detection.
pub trait HitTarget {
    fn moid(&self) -> Moid;
    fn root_moid(&self) -> Moid;
    /// Slots used by this object and its attached subtree.
    fn moid_footprint(&self) -> usize;
    fn gets_hit_by_mos(&self) -> bool;

    /// Whether `moid` falls inside this object's subtree.
    fn owns_moid(&self, moid: Moid) -> bool {
        let start = self.moid().index();
        !self.moid().is_none() && moid.index() >= start && moid.index() < start + self.moid_footprint()
    }
}

impl HitTarget for MovableObject {
    fn moid(&self) -> Moid {
        self.moid
    }

    fn root_moid(&self) -> Moid {
        self.root_moid
    }

    fn moid_footprint(&self) -> usize {
        self.moid_footprint
    }

    fn gets_hit_by_mos(&self) -> bool {
        self.gets_hit_by_mos
    }
}

impl MovableObject {
    /// Register this object alone.
    ///
    /// With `make_new_moid` the object takes a fresh slot. Without it the
    /// object shares the slot registered immediately before it, whatever
    /// that was: the policy depends on call order. An empty index always
    /// gets a fresh slot so MOID 0 stays reserved.
    ///
    /// `root_moid` of `Moid::NONE` makes this object its own root.
    pub fn reg_moid(&mut self, index: &mut MoidIndex, root_moid: Moid, make_new_moid: bool) {
        let root_id = index
            .get(root_moid)
            .map(|e| e.root_id)
            .unwrap_or(self.unique_id);

        self.moid = match index.last() {
            Some(previous) if !make_new_moid => previous,
            _ => index.push(MoidEntry {
                unique_id: self.unique_id,
                root_id,
                team: self.team,
                kind: self.kind,
            }),
        };
        self.root_moid = if root_moid.is_none() { self.moid } else { root_moid };
    }

    /// Register this object and its attached subtree, then record how many
    /// slots the subtree consumed.
    pub fn update_moid(&mut self, index: &mut MoidIndex, root_moid: Moid, make_new_moid: bool) {
        self.reg_moid(index, root_moid, make_new_moid);

        let root = self.root_moid;
        for child in self.children_mut() {
            if child.gets_hit_by_mos {
                let new_moid = child.joint.as_ref().map(|j| j.new_moid).unwrap_or(true);
                child.update_moid(index, root, new_moid);
            } else {
                child.clear_moids();
            }
        }

        self.moid_footprint = index.len() - self.moid.index();
    }

    /// Forget this frame's registration for the whole subtree.
    pub fn clear_moids(&mut self) {
        self.moid = Moid::NONE;
        self.root_moid = Moid::NONE;
        self.moid_footprint = 0;
        for child in self.children_mut() {
            child.clear_moids();
        }
    }
}
