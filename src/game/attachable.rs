//! Attachments
//!
//! A child joined to a parent carries a `Joint`. The parent owns the child
//! outright (`Box<MovableObject>`); the child only remembers its parent's
//! unique id, which is checked against the manager before use.
//!
//! While attached, a child's pose is derived from the parent every update
//! and the forces it collects are handed up to the parent. An impulse
//! stronger than the joint breaks it and the child is released.

use crate::math::{Matrix, Vec2};
use crate::preset::JointDef;
use super::entity::UniqueId;
use super::movable::{MovableObject, UpdateContext};

#[derive(Debug, Clone)]
pub struct Joint {
    /// Where the joint sits on the parent, in parent space
    pub parent_offset: Vec2,
    /// Where the joint sits on the child, in child space
    pub joint_offset: Vec2,
    pub rotation_offset: f32,
    /// Impulse that breaks the joint (0 = unbreakable)
    pub joint_strength: f32,
    /// Share of the child's forces passed to the parent
    pub joint_stiffness: f32,
    pub draw_after_parent: bool,
    pub inherits_hflip: bool,
    pub new_moid: bool,
    /// `UniqueId::NONE` while detached
    pub parent_id: UniqueId,
    /// World position of the joint after the last sync
    pub joint_pos: Vec2,
}

impl Default for Joint {
    fn default() -> Self {
        Self::from_def(&JointDef::default())
    }
}

impl Joint {
    pub fn from_def(def: &JointDef) -> Self {
        Self {
            parent_offset: def.parent_offset,
            joint_offset: def.joint_offset,
            rotation_offset: def.rotation_offset,
            joint_strength: def.joint_strength.max(0.0),
            joint_stiffness: def.joint_stiffness.clamp(0.0, 1.0),
            draw_after_parent: def.draw_after_parent,
            inherits_hflip: def.inherits_hflip,
            new_moid: def.new_moid,
            parent_id: UniqueId::NONE,
            joint_pos: Vec2::ZERO,
        }
    }

    /// Default joint at an offset on the parent.
    pub fn at(parent_offset: Vec2) -> Self {
        Self {
            parent_offset,
            ..Self::default()
        }
    }
}

/// Snapshot of a parent's pose, taken before its children are borrowed.
#[derive(Debug, Clone, Copy)]
pub struct ParentPose {
    pub unique_id: UniqueId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: Matrix,
    pub h_flipped: bool,
}

impl ParentPose {
    pub fn of(obj: &MovableObject) -> Self {
        Self {
            unique_id: obj.unique_id,
            pos: obj.pos,
            vel: obj.vel,
            rotation: obj.rotation,
            h_flipped: obj.h_flipped,
        }
    }

    /// Parent-space offset to world space.
    pub fn to_world(&self, offset: Vec2) -> Vec2 {
        self.pos + offset.rotated_by(&self.rotation, self.h_flipped)
    }
}

impl MovableObject {
    pub fn joint(&self) -> Option<&Joint> {
        self.joint.as_ref()
    }

    pub fn joint_mut(&mut self) -> Option<&mut Joint> {
        self.joint.as_mut()
    }

    pub fn is_attached(&self) -> bool {
        self.joint.as_ref().map_or(false, |j| !j.parent_id.is_none())
    }

    pub fn parent_id(&self) -> Option<UniqueId> {
        self.joint.as_ref().map(|j| j.parent_id).filter(|id| !id.is_none())
    }

    pub fn draws_after_parent(&self) -> bool {
        self.joint.as_ref().map_or(true, |j| j.draw_after_parent)
    }

    pub fn attachables(&self) -> impl Iterator<Item = &MovableObject> {
        self.attachables.iter().map(|b| b.as_ref())
    }

    /// Take ownership of `child` and pin it to this object with `joint`.
    pub fn add_attachable(&mut self, mut child: MovableObject, joint: Joint) {
        child.joint = Some(joint);
        child.bind_to(&ParentPose::of(self));
        self.attachables.push(Box::new(child));
    }

    /// Mark as attached to `parent` and snap to the joint.
    pub(crate) fn bind_to(&mut self, parent: &ParentPose) {
        let joint = self.joint.get_or_insert_with(Joint::default);
        joint.parent_id = parent.unique_id;
        self.sync_to_parent(parent);
    }

    /// Release an attachable by unique id, handing ownership back.
    pub fn remove_attachable(&mut self, uid: UniqueId) -> Option<MovableObject> {
        let idx = self.attachables.iter().position(|c| c.unique_id == uid)?;
        let mut child = *self.attachables.remove(idx);
        child.detach();
        Some(child)
    }

    /// Become a free body. Joint parameters are kept for re-attachment.
    pub fn detach(&mut self) {
        if let Some(joint) = self.joint.as_mut() {
            joint.parent_id = UniqueId::NONE;
        }
        self.forces.clear();
        self.impulses.clear();
    }

    /// Derive pose from the parent's.
    pub(crate) fn sync_to_parent(&mut self, parent: &ParentPose) {
        let Some(joint) = self.joint.as_mut() else {
            return;
        };
        if joint.inherits_hflip {
            self.h_flipped = parent.h_flipped;
        }
        self.rotation.set_angle(parent.rotation.angle() + joint.rotation_offset);
        joint.joint_pos = parent.to_world(joint.parent_offset);
        self.pos = joint.joint_pos - joint.joint_offset.rotated_by(&self.rotation, self.h_flipped);
        self.vel = parent.vel;
    }

    /// Move this child's queued forces onto the parent's queues, scaled by
    /// stiffness. Returns true if the joint broke, in which case the child
    /// keeps its impulses.
    pub(crate) fn transfer_joint_forces(
        &mut self,
        parent_rotation: &Matrix,
        parent_flipped: bool,
        parent_forces: &mut Vec<(Vec2, Vec2)>,
        parent_impulses: &mut Vec<(Vec2, Vec2)>,
    ) -> bool {
        let Some(joint) = self.joint.as_ref() else {
            return false;
        };
        let stiffness = joint.joint_stiffness;
        let offset = joint.parent_offset.rotated_by(parent_rotation, parent_flipped);

        let total = self.impulses.iter().fold(Vec2::ZERO, |acc, (i, _)| acc + *i);
        if joint.joint_strength > 0.0 && total.magnitude() * stiffness > joint.joint_strength {
            log::debug!(
                "{} joint breaks under impulse {:.1} (strength {:.1})",
                self.unique_id,
                total.magnitude(),
                joint.joint_strength
            );
            return true;
        }

        for (force, _) in self.forces.drain(..) {
            parent_forces.push((force * stiffness, offset));
        }
        for (impulse, _) in self.impulses.drain(..) {
            parent_impulses.push((impulse * stiffness, offset));
        }
        false
    }

    /// Sync, update and collect forces from every attachable. Broken ones
    /// are removed and pushed to `released`; so are expired ones, flagged
    /// for deletion.
    pub(crate) fn update_attachables(&mut self, ctx: &UpdateContext, released: &mut Vec<MovableObject>) {
        let pose = ParentPose::of(self);
        let mut broken = Vec::new();
        let mut expired = Vec::new();

        for (i, child) in self.attachables.iter_mut().enumerate() {
            if child.is_expired() {
                expired.push(i);
                continue;
            }
            child.sync_to_parent(&pose);
            released.extend(child.update(ctx));
            if child.transfer_joint_forces(&pose.rotation, pose.h_flipped, &mut self.forces, &mut self.impulses) {
                broken.push(i);
            }
        }

        let mut gone: Vec<(usize, bool)> = broken.into_iter().map(|i| (i, false)).collect();
        gone.extend(expired.into_iter().map(|i| (i, true)));
        gone.sort_unstable();
        for (i, is_expired) in gone.into_iter().rev() {
            let mut child = *self.attachables.remove(i);
            if is_expired {
                log::debug!("{} drops expired part {}", self.unique_id, child.unique_id);
                child.detach();
                child.to_delete = true;
            } else {
                child.detach_keeping_impulses();
            }
            released.push(child);
        }
    }

    /// Detach after a joint break: the breaking impulse stays queued so the
    /// part flies off with it.
    pub(crate) fn detach_keeping_impulses(&mut self) {
        if let Some(joint) = self.joint.as_mut() {
            joint.parent_id = UniqueId::NONE;
        }
        self.forces.clear();
    }
}
