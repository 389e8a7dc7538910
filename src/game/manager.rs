//! Object Manager
//!
//! `MovableMan` owns every free (root) object. Attached parts live inside
//! their parents and are reached through them. Roots are addressed by
//! generational `MoHandle`s so a handle held across frames can be checked
//! with `valid_mo` before use.
//!
//! Additions are queued and flushed at the start of a frame; deletion,
//! settling and gibbing are flags consumed by `cleanup` after every object
//! has been updated. Nothing is removed while the phase loops run.

use std::collections::HashMap;

use rand::Rng;

use crate::config::SimConfig;
use crate::preset::PresetRegistry;
use super::collision::{MoHit, TravelContext};
use super::component::SlotStorage;
use super::entity::{HandleAllocator, MoHandle, UniqueId, UniqueIds};
use super::event::*;
use super::id_buffer::IdBuffer;
use super::moid::{HitTarget, Moid, MoidIndex};
use super::movable::{MovableObject, PhysicsBody, UpdateContext};
use super::scene::{Scene, SceneQuery};

pub struct MovableMan {
    handles: HandleAllocator,
    objects: SlotStorage<MovableObject>,
    /// Root unique id to handle
    by_uid: HashMap<UniqueId, MoHandle>,
    /// Objects waiting for the next flush
    add_queue: Vec<MovableObject>,
}

impl MovableMan {
    pub fn new() -> Self {
        Self {
            handles: HandleAllocator::new(),
            objects: SlotStorage::new(),
            by_uid: HashMap::new(),
            add_queue: Vec::new(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Queue an object; it joins at the next `flush_additions`.
    pub fn add(&mut self, obj: MovableObject) {
        self.add_queue.push(obj);
    }

    pub fn pending_additions(&self) -> usize {
        self.add_queue.len()
    }

    /// Register an object right away. Panics if it is already registered.
    pub fn add_immediate(&mut self, mut obj: MovableObject) -> MoHandle {
        let uid = obj.unique_id();
        assert!(
            !self.by_uid.contains_key(&uid),
            "object {} registered twice",
            uid
        );
        if let Some(joint) = obj.joint_mut() {
            joint.parent_id = UniqueId::NONE;
        }
        let handle = self.handles.allocate();
        self.by_uid.insert(uid, handle);
        self.objects.insert(handle, obj);
        handle
    }

    /// Move queued objects into the live set.
    pub fn flush_additions(&mut self, events: &mut Events) -> usize {
        let queue = std::mem::take(&mut self.add_queue);
        let count = queue.len();
        for obj in queue {
            events.spawned.send(SpawnedEvent {
                unique_id: obj.unique_id(),
                kind: obj.kind(),
                position: obj.pos,
            });
            log::debug!("spawn {} '{}' ({})", obj.unique_id(), obj.preset_name(), obj.class_name());
            self.add_immediate(obj);
        }
        count
    }

    /// Unregister a root and hand it back. Script state is not torn down.
    pub fn remove(&mut self, handle: MoHandle) -> Option<MovableObject> {
        if !self.handles.free(handle) {
            return None;
        }
        let obj = self.objects.remove(handle)?;
        self.by_uid.remove(&obj.unique_id());
        Some(obj)
    }

    /// Unregister and destroy a root.
    pub fn delete(&mut self, handle: MoHandle) -> bool {
        match self.remove(handle) {
            Some(mut obj) => {
                obj.destroy();
                true
            }
            None => false,
        }
    }

    /// Destroy everything, including queued additions.
    pub fn clear(&mut self) {
        for (_, obj) in self.objects.iter_mut() {
            obj.destroy();
        }
        self.objects.clear();
        self.handles.clear();
        self.by_uid.clear();
        self.add_queue.clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether a handle still refers to a live root.
    pub fn valid_mo(&self, handle: MoHandle) -> bool {
        self.handles.is_alive(handle)
    }

    pub fn is_actor(&self, handle: MoHandle) -> bool {
        self.get(handle).map_or(false, |o| o.is_actor())
    }

    pub fn get(&self, handle: MoHandle) -> Option<&MovableObject> {
        if !self.handles.is_alive(handle) {
            return None;
        }
        self.objects.get(handle)
    }

    pub fn get_mut(&mut self, handle: MoHandle) -> Option<&mut MovableObject> {
        if !self.handles.is_alive(handle) {
            return None;
        }
        self.objects.get_mut(handle)
    }

    /// Handle of a root object by unique id.
    pub fn handle_of(&self, uid: UniqueId) -> Option<MoHandle> {
        self.by_uid.get(&uid).copied()
    }

    /// Any live object by unique id, attached parts included.
    pub fn find(&self, uid: UniqueId) -> Option<&MovableObject> {
        if let Some(handle) = self.handle_of(uid) {
            return self.get(handle);
        }
        self.objects.iter().find_map(|(_, o)| o.find(uid))
    }

    pub fn find_mut(&mut self, uid: UniqueId) -> Option<&mut MovableObject> {
        if let Some(handle) = self.handle_of(uid) {
            return self.get_mut(handle);
        }
        self.objects.iter_mut().find_map(|(_, o)| o.find_mut(uid))
    }

    /// Handle of the root whose subtree contains `uid`.
    pub fn root_of(&self, uid: UniqueId) -> Option<MoHandle> {
        self.iter().find(|(_, o)| o.find(uid).is_some()).map(|(h, _)| h)
    }

    pub fn valid_uid(&self, uid: UniqueId) -> bool {
        self.find(uid).is_some()
    }

    /// Live roots.
    pub fn count(&self) -> usize {
        self.handles.alive_count() as usize
    }

    /// Live objects including attached parts.
    pub fn total_count(&self) -> usize {
        self.objects.iter().map(|(_, o)| o.tree_size()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoHandle, &MovableObject)> {
        self.objects
            .iter()
            .filter_map(|(slot, o)| self.handles.handle_at(slot).map(|h| (h, o)))
    }

    pub fn handles(&self) -> Vec<MoHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut MovableObject> {
        self.objects.iter_mut().map(|(_, o)| o)
    }

    // =========================================================================
    // Frame phases
    // =========================================================================

    pub fn pre_travel_all(&mut self, ids: &mut IdBuffer, config: &SimConfig) {
        for obj in self.objects_mut() {
            obj.pre_travel(ids, config);
        }
    }

    /// Add every live ignore target's MOIDs to its hitter's ignore list.
    /// Targets that have gone away are skipped for the frame.
    pub fn apply_ignore_targets(&mut self) {
        let mut ignores: Vec<(UniqueId, Moid, usize)> = Vec::new();
        for (_, obj) in self.objects.iter() {
            let Some(target_uid) = obj.ignore_uid() else {
                continue;
            };
            if let Some(target) = self.find(target_uid) {
                if !target.moid().is_none() {
                    ignores.push((obj.unique_id(), target.moid(), target.moid_footprint()));
                }
            }
        }

        for (uid, first, footprint) in ignores {
            if let Some(obj) = self.find_mut(uid) {
                for raw in first.get()..first.get() + footprint.max(1) as u32 {
                    obj.add_moid_to_ignore(Moid::new(raw));
                }
            }
        }
    }

    /// Travel every root. Returns (hitter, hit) pairs for `resolve_mo_hits`.
    pub fn travel_all(&mut self, ctx: &TravelContext) -> Vec<(UniqueId, MoHit)> {
        let mut hits = Vec::new();
        for obj in self.objects_mut() {
            let outcome = obj.travel(ctx);
            if let Some(hit) = outcome.mo_hit {
                hits.push((obj.unique_id(), hit));
            }
        }
        hits
    }

    /// Apply MO-vs-MO hits: the hitter hands `transfer` of its momentum to
    /// the root it hit and loses that share of its speed.
    pub fn resolve_mo_hits(&mut self, hits: Vec<(UniqueId, MoHit)>, moids: &MoidIndex, transfer: f32, events: &mut Events) {
        for (hitter_uid, hit) in hits {
            let Some(entry) = moids.get(hit.moid).copied() else {
                continue;
            };
            let (Some(hitter_handle), Some(target_handle)) = (self.handle_of(hitter_uid), self.handle_of(entry.root_id)) else {
                continue;
            };
            if hitter_handle == target_handle {
                continue;
            }
            if self.get(target_handle).map_or(true, |t| t.was_hit_by(hitter_uid)) {
                continue;
            }

            let Some(hitter) = self.get_mut(hitter_handle) else {
                continue;
            };
            let impulse = hitter.momentum() * transfer;
            hitter.vel = hitter.vel * (1.0 - transfer);

            let Some(target) = self.get_mut(target_handle) else {
                continue;
            };
            let offset = hit.point - target.pos;
            target.add_impulse(impulse, offset);
            target.record_hit_by(hitter_uid);
            if let Some(part) = target.find_mut(entry.unique_id) {
                part.hit_particle_uid = hitter_uid;
            }

            events.mo_hit.send(MoHitEvent {
                hitter: hitter_uid,
                target: entry.root_id,
                target_moid: hit.moid,
                point: hit.point,
                impulse,
            });
        }
    }

    pub fn post_travel_all(&mut self, ids: &mut IdBuffer, scene: &dyn SceneQuery, config: &SimConfig) {
        for obj in self.objects_mut() {
            obj.post_travel(ids, scene, config);
        }
    }

    /// Update every root. Parts that broke off are queued as new roots.
    pub fn update_all(&mut self, ctx: &UpdateContext, events: &mut Events) {
        let mut released = Vec::new();
        for obj in self.objects_mut() {
            let root = obj.unique_id();
            released.extend(obj.update(ctx).into_iter().map(|part| (root, part)));
        }
        for (root, part) in released {
            events.detached.send(DetachedEvent {
                unique_id: part.unique_id(),
                parent: root,
            });
            self.add(part);
        }
    }

    /// Consume gib, delete and settle flags.
    pub fn cleanup(
        &mut self,
        scene: &mut Scene,
        presets: &PresetRegistry,
        uids: &mut UniqueIds,
        rng: &mut impl Rng,
        config: &SimConfig,
        events: &mut Events,
    ) {
        for handle in self.handles() {
            let Some(obj) = self.get_mut(handle) else {
                continue;
            };

            let mut gibbed = false;
            if obj.to_gib() {
                let debris = obj.gib_this(presets, uids, rng);
                events.gibbed.send(GibbedEvent {
                    unique_id: obj.unique_id(),
                    position: obj.pos,
                    pieces: debris.len(),
                });
                gibbed = true;
                for piece in debris {
                    self.add(piece);
                }
            }

            let Some(obj) = self.get(handle) else {
                continue;
            };
            if obj.to_delete() {
                let reason = if gibbed {
                    DeleteReason::Gibbed
                } else if !scene.is_within_bounds(obj.pos, config.out_of_bounds_margin) {
                    DeleteReason::OutOfBounds
                } else {
                    DeleteReason::Flagged
                };
                let position = obj.pos;
                if let Some(mut obj) = self.remove(handle) {
                    obj.destroy();
                    events.deleted.send(DeletedEvent {
                        unique_id: obj.unique_id(),
                        reason,
                        position,
                    });
                }
            } else if obj.to_settle() {
                if let Some(mut obj) = self.remove(handle) {
                    let pixels = settle_into(&obj, scene);
                    log::debug!("settle {} ({} px)", obj.unique_id(), pixels);
                    obj.destroy();
                    events.settled.send(SettledEvent {
                        unique_id: obj.unique_id(),
                        position: obj.pos,
                        pixels,
                    });
                }
            }
        }
    }

    /// Rebuild the MOID index and redraw the raster from scratch.
    pub fn register_all(&mut self, index: &mut MoidIndex, ids: &mut IdBuffer) {
        index.clear();
        ids.clear();
        for obj in self.objects_mut() {
            if obj.gets_hit_by_mos() {
                obj.update_moid(index, Moid::NONE, true);
            } else {
                obj.clear_moids();
            }
            ids.draw_tree(obj);
        }
        log::trace!("registered {} MOIDs for {} roots", index.len() - 1, self.count());
    }
}

impl Default for MovableMan {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamp an object and its parts into terrain.
fn settle_into(obj: &MovableObject, scene: &mut Scene) -> usize {
    let mut written = scene.settle_pixels(&obj.silhouette_pixels(), obj.material());
    for child in obj.children() {
        written += settle_into(child, scene);
    }
    written
}
