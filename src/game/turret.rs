//! Turrets
//!
//! A turret owns at most one mounted object, usually a held device. Each
//! update it places the device at its mount point, lets it update, and
//! takes its recoil. A recoil strong enough to break the device's joint
//! tears it off the mount.

use crate::math::Vec2;
use crate::preset::TurretDef;
use super::attachable::{Joint, ParentPose};
use super::movable::{MovableObject, Role, UpdateContext};

#[derive(Debug, Default)]
pub struct Turret {
    pub mounted: Option<Box<MovableObject>>,
    /// Mount point in turret space
    pub mounted_offset: Vec2,
    pub mounted_rotation_offset: f32,
}

impl Turret {
    pub fn from_def(def: &TurretDef) -> Self {
        Self {
            mounted: None,
            mounted_offset: def.mounted_offset,
            mounted_rotation_offset: def.mounted_rotation_offset,
        }
    }
}

impl MovableObject {
    /// Mounted device of a turret.
    pub fn mounted(&self) -> Option<&MovableObject> {
        match &self.role {
            Role::Turret(t) => t.mounted.as_deref(),
            _ => None,
        }
    }

    /// Put `device` on this turret's mount, replacing and returning any
    /// previous one. Non-turrets hand the device straight back.
    pub fn set_mounted(&mut self, mut device: MovableObject) -> Result<Option<MovableObject>, MovableObject> {
        let pose = ParentPose::of(self);
        let Role::Turret(turret) = &mut self.role else {
            return Err(device);
        };

        let joint = device.joint.get_or_insert_with(Joint::default);
        joint.parent_offset = turret.mounted_offset;
        joint.rotation_offset = turret.mounted_rotation_offset;
        device.bind_to(&pose);

        let previous = turret.mounted.replace(Box::new(device)).map(|mut old| {
            old.detach();
            *old
        });
        Ok(previous)
    }

    pub(crate) fn update_turret(&mut self, ctx: &UpdateContext, released: &mut Vec<MovableObject>) {
        let attached = self.is_attached();
        let pose = ParentPose::of(self);
        let Role::Turret(turret) = &mut self.role else {
            return;
        };
        let Some(device) = turret.mounted.as_deref_mut() else {
            return;
        };

        if let Some(joint) = device.joint.as_mut() {
            joint.parent_offset = turret.mounted_offset;
            joint.rotation_offset = turret.mounted_rotation_offset;
            // A free turret carries its own flip; an attached one has it
            // imposed and passes it on.
            joint.inherits_hflip = attached;
        }
        device.sync_to_parent(&pose);
        released.extend(device.update(ctx));

        let broke = device.transfer_joint_forces(&pose.rotation, pose.h_flipped, &mut self.forces, &mut self.impulses);
        if broke {
            if let Some(mut device) = turret.mounted.take() {
                log::debug!("{} loses mounted {}", self.unique_id, device.unique_id);
                device.detach_keeping_impulses();
                released.push(*device);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::UniqueIds;
    use crate::game::moid::{HitTarget, Moid, MoidIndex};
    use crate::game::scene::Scene;
    use crate::preset::ObjectKind;
    use std::f32::consts::FRAC_PI_2;

    fn turret_with_device(ids: &mut UniqueIds, offset: Vec2) -> MovableObject {
        let mut turret = MovableObject::new(ObjectKind::Turret, ids.next_id());
        turret.role = Role::Turret(Turret { mounted_offset: offset, ..Turret::default() });
        let device = MovableObject::new(ObjectKind::HeldDevice, ids.next_id());
        assert!(turret.set_mounted(device).unwrap().is_none());
        turret
    }

    #[test]
    fn test_turret_and_device_footprint() {
        let mut ids = UniqueIds::new();
        let mut index = MoidIndex::new();
        let mut turret = turret_with_device(&mut ids, Vec2::new(2.0, 0.0));

        turret.update_moid(&mut index, Moid::NONE, true);

        assert_eq!(index.len(), 3);
        assert_eq!(turret.moid_footprint(), 2);
        let device = turret.mounted().unwrap();
        assert_eq!(device.root_moid(), turret.moid());
        assert_ne!(device.moid(), turret.moid());
    }

    #[test]
    fn test_device_follows_mount() {
        let mut ids = UniqueIds::new();
        let mut turret = turret_with_device(&mut ids, Vec2::new(5.0, 0.0));
        turret.pos = Vec2::new(20.0, 20.0);
        turret.rotation.set_angle(FRAC_PI_2);

        let scene = Scene::new(64, 64, false);
        let released = turret.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene });
        assert!(released.is_empty());

        let device = turret.mounted().unwrap();
        assert!((device.pos.x - 20.0).abs() < 1e-4);
        assert!((device.pos.y - 25.0).abs() < 1e-4);
        assert!((device.rotation.angle() - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_device_recoil_reaches_turret() {
        let mut ids = UniqueIds::new();
        let mut turret = turret_with_device(&mut ids, Vec2::ZERO);
        if let Role::Turret(t) = &mut turret.role {
            t.mounted.as_mut().unwrap().add_impulse(Vec2::new(-3.0, 0.0), Vec2::ZERO);
        }

        let scene = Scene::new(64, 64, false);
        let released = turret.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene });
        assert!(released.is_empty());
        assert_eq!(turret.impulses().len(), 1);
    }

    #[test]
    fn test_breaking_recoil_releases_device() {
        let mut ids = UniqueIds::new();
        let mut turret = turret_with_device(&mut ids, Vec2::ZERO);
        if let Role::Turret(t) = &mut turret.role {
            let device = t.mounted.as_mut().unwrap();
            device.joint.as_mut().unwrap().joint_strength = 1.0;
            device.add_impulse(Vec2::new(-30.0, 0.0), Vec2::ZERO);
        }

        let scene = Scene::new(64, 64, false);
        let released = turret.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene });
        assert_eq!(released.len(), 1);
        assert!(turret.mounted().is_none());
        assert!(!released[0].is_attached());
    }

    #[test]
    fn test_attached_turret_flips_device() {
        let mut ids = UniqueIds::new();
        let mut body = MovableObject::new(ObjectKind::Actor, ids.next_id());
        body.h_flipped = true;
        let turret = turret_with_device(&mut ids, Vec2::new(3.0, 0.0));
        body.add_attachable(turret, Joint::default());

        let scene = Scene::new(64, 64, false);
        body.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene });

        let turret = body.attachables().next().unwrap();
        assert!(turret.h_flipped);
        assert!(turret.mounted().unwrap().h_flipped);
    }

    #[test]
    fn test_set_mounted_on_non_turret_fails() {
        let mut ids = UniqueIds::new();
        let mut body = MovableObject::new(ObjectKind::Actor, ids.next_id());
        let device = MovableObject::new(ObjectKind::HeldDevice, ids.next_id());
        assert!(body.set_mounted(device).is_err());
    }
}
