//! Legs
//!
//! Procedural foot placement. A leg hangs off its body at the hip (its
//! joint position) and keeps an ankle offset from the hip. Callers point it
//! at a scene position with `reach_toward`; each update the ankle eases
//! toward that target, or toward the idle pose when the target is out of
//! reach, and is clamped to the leg's extension range. The owned foot sits
//! at the ankle.

use crate::math::{ease_out, lerp, Vec2};
use crate::preset::LegDef;
use super::attachable::ParentPose;
use super::movable::{MovableObject, Role, UpdateContext};
use super::scene::SceneQuery;

/// Targets higher above the hip than this are treated as unreachable.
const MAX_UPWARD_REACH: f32 = 3.0;

/// Pushed past `min_extension` so a clamped leg is not borderline.
const MIN_EXTENSION_MARGIN: f32 = 0.1;

#[derive(Debug)]
pub struct Leg {
    pub foot: Option<Box<MovableObject>>,
    /// Hip to ankle
    pub ankle_offset: Vec2,
    /// Hip to where the foot wants to be
    pub target_offset: Vec2,
    pub idle_offset: Vec2,
    pub will_idle: bool,
    pub min_extension: f32,
    pub max_extension: f32,
    /// Fraction of the remaining distance covered per update, 0..=1
    pub move_speed: f32,
    pub frame_count: u32,
    pub frame: u32,
    pub contracted_angle: f32,
    pub extended_angle: f32,
}

impl Default for Leg {
    fn default() -> Self {
        Self::from_def(&LegDef::default())
    }
}

impl Leg {
    pub fn from_def(def: &LegDef) -> Self {
        let min_extension = def.min_extension.max(0.0);
        let max_extension = def.max_extension.max(min_extension);
        Self {
            foot: None,
            ankle_offset: def.idle_offset,
            target_offset: def.idle_offset,
            idle_offset: def.idle_offset,
            will_idle: def.will_idle,
            min_extension,
            max_extension,
            move_speed: def.move_speed.clamp(0.0, 1.0),
            frame_count: def.frame_count.max(1),
            frame: 0,
            contracted_angle: def.contracted_angle,
            extended_angle: def.extended_angle,
        }
    }

    /// Clamp the ankle offset into the extension range. False when the leg
    /// had to be shortened to `max_extension`, i.e. the target is too far.
    pub fn constrain_foot(&mut self) -> bool {
        let length = self.ankle_offset.magnitude();
        if length < self.min_extension {
            self.ankle_offset = self.ankle_offset.with_magnitude(self.min_extension + MIN_EXTENSION_MARGIN);
            true
        } else if length > self.max_extension {
            self.ankle_offset = self.ankle_offset.with_magnitude(self.max_extension);
            false
        } else {
            true
        }
    }

    /// 0 = fully contracted, 1 = fully extended.
    pub fn extension_ratio(&self) -> f32 {
        let range = self.max_extension - self.min_extension;
        if range <= f32::EPSILON {
            return 1.0;
        }
        ((self.ankle_offset.magnitude() - self.min_extension) / range).clamp(0.0, 1.0)
    }

    /// Pick the animation frame from the extension ratio.
    pub fn bend_leg(&mut self) -> u32 {
        let frame = (self.extension_ratio() * self.frame_count as f32).floor() as u32;
        self.frame = frame.min(self.frame_count.max(1) - 1);
        self.frame
    }

    /// Angle the sprite is drawn at so the foot lines up with the ankle.
    pub fn sprite_angle(&self, flipped: bool) -> f32 {
        let bend = lerp(self.contracted_angle, self.extended_angle, ease_out(self.extension_ratio()));
        self.ankle_offset.x_flipped(flipped).angle() - bend
    }

    fn target_reachable(&self) -> bool {
        self.target_offset.magnitude() <= self.max_extension && self.target_offset.y >= -MAX_UPWARD_REACH
    }

    /// Step the ankle toward the target, the idle pose, or snap.
    fn step_ankle(&mut self, flipped: bool) {
        if self.target_reachable() {
            self.ankle_offset = self.ankle_offset.lerp(self.target_offset, self.move_speed);
        } else if self.will_idle {
            self.ankle_offset = self.ankle_offset.lerp(self.idle_offset.x_flipped(flipped), self.move_speed);
        } else {
            self.ankle_offset = self.target_offset;
        }
    }
}

impl MovableObject {
    pub fn leg(&self) -> Option<&Leg> {
        match &self.role {
            Role::Leg(l) => Some(l),
            _ => None,
        }
    }

    pub fn leg_mut(&mut self) -> Option<&mut Leg> {
        match &mut self.role {
            Role::Leg(l) => Some(l),
            _ => None,
        }
    }

    /// Hip position: the joint position when attached, own position when free.
    pub fn hip_pos(&self) -> Vec2 {
        match &self.joint {
            Some(j) if self.is_attached() => j.joint_pos,
            _ => self.pos,
        }
    }

    /// Aim the foot at a scene point.
    pub fn reach_toward(&mut self, point: Vec2, scene: &dyn SceneQuery) {
        let hip = self.hip_pos();
        if let Role::Leg(leg) = &mut self.role {
            leg.target_offset = scene.shortest_distance(hip, point);
        }
    }

    /// World position of the ankle.
    pub fn ankle_pos(&self) -> Option<Vec2> {
        self.leg().map(|l| self.hip_pos() + l.ankle_offset)
    }

    /// Give this leg a foot, returning any previous one.
    pub fn set_foot(&mut self, mut foot: MovableObject) -> Result<Option<MovableObject>, MovableObject> {
        let hip = self.hip_pos();
        let pose = ParentPose::of(self);
        let Role::Leg(leg) = &mut self.role else {
            return Err(foot);
        };
        foot.bind_to(&pose);
        foot.pos = hip + leg.ankle_offset;

        let previous = leg.foot.replace(Box::new(foot)).map(|mut old| {
            old.detach();
            *old
        });
        Ok(previous)
    }

    pub(crate) fn update_leg(&mut self, ctx: &UpdateContext, released: &mut Vec<MovableObject>) {
        let attached = self.is_attached();
        let flipped = self.h_flipped;
        let hip = self.hip_pos();
        let unique_id = self.unique_id;

        let Role::Leg(leg) = &mut self.role else {
            return;
        };

        if attached {
            leg.step_ankle(flipped);
        } else {
            // Free leg: hang straight out along its own axis
            leg.ankle_offset = Vec2::new(leg.max_extension * 0.6, 0.0).rotated_by(&self.rotation, flipped);
        }
        leg.constrain_foot();
        leg.bend_leg();

        if attached {
            let angle = leg.sprite_angle(flipped);
            self.rotation.set_angle(angle);
        }

        let Some(foot) = leg.foot.as_deref_mut() else {
            return;
        };
        let foot_pose = ParentPose {
            unique_id,
            pos: hip + leg.ankle_offset,
            vel: self.vel,
            rotation: self.rotation,
            h_flipped: flipped,
        };
        if let Some(joint) = foot.joint.as_mut() {
            joint.parent_offset = Vec2::ZERO;
        }
        foot.sync_to_parent(&foot_pose);
        released.extend(foot.update(ctx));

        let rotation = self.rotation;
        if foot.transfer_joint_forces(&rotation, flipped, &mut self.forces, &mut self.impulses) {
            if let Some(mut foot) = leg.foot.take() {
                log::debug!("{} loses foot {}", unique_id, foot.unique_id);
                foot.detach_keeping_impulses();
                released.push(*foot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::attachable::Joint;
    use crate::game::entity::UniqueIds;
    use crate::game::scene::Scene;
    use crate::preset::ObjectKind;
    use proptest::prelude::*;

    fn leg(min: f32, max: f32) -> Leg {
        Leg::from_def(&LegDef {
            min_extension: min,
            max_extension: max,
            ..LegDef::default()
        })
    }

    fn attached_leg(ids: &mut UniqueIds) -> MovableObject {
        let mut body = MovableObject::new(ObjectKind::Actor, ids.next_id());
        body.pos = Vec2::new(50.0, 50.0);
        let mut l = MovableObject::new(ObjectKind::Leg, ids.next_id());
        l.role = Role::Leg(leg(4.0, 12.0));
        body.add_attachable(l, Joint::at(Vec2::new(0.0, 4.0)));
        body
    }

    #[test]
    fn test_constrain_clamps_long_offset() {
        let mut l = leg(4.0, 12.0);
        l.ankle_offset = Vec2::new(0.0, 20.0);
        assert!(!l.constrain_foot());
        assert!((l.ankle_offset.magnitude() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_constrain_pushes_short_offset() {
        let mut l = leg(4.0, 12.0);
        l.ankle_offset = Vec2::new(1.0, 0.0);
        assert!(l.constrain_foot());
        assert!((l.ankle_offset.magnitude() - 4.1).abs() < 1e-4);
    }

    #[test]
    fn test_constrain_keeps_in_range() {
        let mut l = leg(4.0, 12.0);
        l.ankle_offset = Vec2::new(3.0, 4.0);
        assert!(l.constrain_foot());
        assert_eq!(l.ankle_offset, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_bend_leg_frames() {
        let mut l = leg(4.0, 12.0);
        l.frame_count = 5;
        l.ankle_offset = Vec2::new(0.0, 4.0);
        assert_eq!(l.bend_leg(), 0);
        l.ankle_offset = Vec2::new(0.0, 12.0);
        assert_eq!(l.bend_leg(), 4);
        l.ankle_offset = Vec2::new(0.0, 8.0);
        assert_eq!(l.bend_leg(), 2);
    }

    #[test]
    fn test_bend_leg_without_frames() {
        let mut l = Leg::default();
        l.frame_count = 0;
        l.ankle_offset = Vec2::new(0.0, 12.0);
        assert_eq!(l.bend_leg(), 0);
    }

    #[test]
    fn test_sprite_angle_eases_between_poses() {
        let mut l = leg(4.0, 12.0);
        l.contracted_angle = 0.6;
        l.extended_angle = 0.0;
        let down = Vec2::new(0.0, 1.0).angle();

        l.ankle_offset = Vec2::new(0.0, 4.0);
        assert!((l.sprite_angle(false) - (down - 0.6)).abs() < 1e-5);

        l.ankle_offset = Vec2::new(0.0, 12.0);
        assert!((l.sprite_angle(false) - down).abs() < 1e-5);

        // Halfway out the correction is already three quarters gone
        l.ankle_offset = Vec2::new(0.0, 8.0);
        assert!((l.sprite_angle(false) - (down - 0.15)).abs() < 1e-5);
    }

    #[test]
    fn test_reach_eases_toward_target() {
        let mut ids = UniqueIds::new();
        let mut body = attached_leg(&mut ids);
        let scene = Scene::new(128, 128, false);
        let ctx = UpdateContext { dt: 1.0 / 60.0, scene: &scene };

        body.update(&ctx);
        let hip = body.attachables[0].hip_pos();
        let target = hip + Vec2::new(6.0, 6.0);
        body.attachables[0].reach_toward(target, &scene);

        for _ in 0..30 {
            body.update(&ctx);
        }
        let ankle = body.attachables[0].ankle_pos().unwrap();
        assert!((ankle - target).magnitude() < 0.1);
    }

    #[test]
    fn test_unreachable_target_goes_idle() {
        let mut ids = UniqueIds::new();
        let mut body = attached_leg(&mut ids);
        let scene = Scene::new(128, 128, false);
        let ctx = UpdateContext { dt: 1.0 / 60.0, scene: &scene };

        body.update(&ctx);
        let hip = body.attachables[0].hip_pos();
        body.attachables[0].reach_toward(hip + Vec2::new(0.0, -40.0), &scene);
        for _ in 0..30 {
            body.update(&ctx);
        }
        let l = body.attachables[0].leg().unwrap();
        assert!((l.ankle_offset - l.idle_offset).magnitude() < 0.1);
    }

    #[test]
    fn test_foot_sits_at_ankle() {
        let mut ids = UniqueIds::new();
        let mut body = attached_leg(&mut ids);
        let foot = MovableObject::new(ObjectKind::Attachable, ids.next_id());
        assert!(body.attachables[0].set_foot(foot).unwrap().is_none());

        let scene = Scene::new(128, 128, false);
        body.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene });

        let leg_obj = &body.attachables[0];
        let ankle = leg_obj.ankle_pos().unwrap();
        let foot = leg_obj.children().next().unwrap();
        assert!((foot.pos - ankle).magnitude() < 1e-4);
        assert_eq!(leg_obj.tree_size(), 2);
    }

    proptest! {
        #[test]
        fn constrained_length_in_range(x in -50.0f32..50.0, y in -50.0f32..50.0) {
            let mut l = leg(4.0, 12.0);
            l.ankle_offset = Vec2::new(x, y);
            l.constrain_foot();
            let m = l.ankle_offset.magnitude();
            prop_assert!(m >= 4.0 - 1e-3 && m <= 12.0 + 1e-3);
        }
    }
}
