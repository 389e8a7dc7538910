//! Collision
//!
//! Objects move through the scene via a `Collider`. The stock collider is
//! an `AtomGroup`: a handful of sample points in object space, stepped at
//! most one pixel at a time and tested against the terrain bitmap and the
//! MOID raster.
//!
//! Terrain hits are resolved per axis: the blocked axis bounces with the
//! combined restitution and the other axis loses speed to friction. MO hits
//! are only detected here; the manager resolves them once every object has
//! travelled.

use std::fmt::Debug;

use crate::math::Vec2;
use super::id_buffer::IdBuffer;
use super::moid::{HitTarget, Moid, MoidIndex};
use super::movable::MovableObject;
use super::scene::{MaterialId, SceneQuery, AIR};

/// Upper bound on sub-steps per travel call.
const MAX_STEPS: usize = 64;

/// Floor bounces slower than this stop dead when settling is allowed.
const SETTLE_BOUNCE_SPEED: f32 = 1.0;

/// What a collider needs from the world during travel.
pub struct TravelContext<'a> {
    pub dt: f32,
    pub global_acc: Vec2,
    pub scene: &'a dyn SceneQuery,
    /// Last frame's MOID raster, stable for the whole travel phase
    pub hit_buffer: &'a IdBuffer,
    pub moids: &'a MoidIndex,
    /// Let slow floor bounces come to rest
    pub allow_settle: bool,
}

/// Another object's pixel touched while travelling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoHit {
    pub moid: Moid,
    pub point: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct TravelOutcome {
    pub terrain_hits: u32,
    /// Material of the last terrain pixel hit, `AIR` if none
    pub terrain_material: MaterialId,
    pub mo_hit: Option<MoHit>,
}

impl TravelOutcome {
    /// Discrete collision events this travel.
    pub fn hit_count(&self) -> u32 {
        self.terrain_hits + self.mo_hit.is_some() as u32
    }
}

/// Shape-vs-world service used by `MovableObject::travel`.
pub trait Collider: Debug {
    /// Advance `body` by its velocity for one step.
    fn travel(&mut self, body: &mut MovableObject, ctx: &TravelContext) -> TravelOutcome;

    /// Skip hits on `moid` until the ignore list is cleared.
    fn add_moid_to_ignore(&mut self, moid: Moid);

    fn clear_moid_ignore_list(&mut self);

    fn ignores_moid(&self, moid: Moid) -> bool;

    /// Material used when the owner is baked into terrain.
    fn material(&self) -> MaterialId;

    /// Sample points in object space.
    fn atoms(&self) -> &[Vec2];
}

#[derive(Debug, Clone)]
pub struct AtomGroup {
    atoms: Vec<Vec2>,
    material: MaterialId,
    ignored: Vec<Moid>,
}

impl AtomGroup {
    pub fn new(atoms: Vec<Vec2>, material: MaterialId) -> Self {
        let atoms = if atoms.is_empty() { vec![Vec2::ZERO] } else { atoms };
        Self {
            atoms,
            material,
            ignored: Vec::new(),
        }
    }

    pub fn is_ignored(&self, moid: Moid) -> bool {
        self.ignored.contains(&moid)
    }

    fn world_atoms<'a>(&'a self, body: &'a MovableObject, at: Vec2) -> impl Iterator<Item = (i32, i32)> + 'a {
        self.atoms
            .iter()
            .map(move |a| (at + a.rotated_by(&body.rotation, body.h_flipped)).to_pixel())
    }

    /// First solid material under any atom with the body placed at `at`.
    fn terrain_at(&self, body: &MovableObject, at: Vec2, scene: &dyn SceneQuery) -> Option<MaterialId> {
        self.world_atoms(body, at)
            .map(|(x, y)| scene.material_at(x, y))
            .find(|&m| m != AIR)
    }

    /// First foreign MOID under any atom.
    fn mo_at(&self, body: &MovableObject, ctx: &TravelContext) -> Option<MoHit> {
        if !body.hits_mos || body.ignores_atom_group_hits {
            return None;
        }
        for (x, y) in self.world_atoms(body, body.pos) {
            let moid = ctx.hit_buffer.get(x, y);
            if moid.is_none() || body.owns_moid(moid) || self.is_ignored(moid) {
                continue;
            }
            if body.ignores_team_hits && body.team.is_some() {
                let same_team = ctx.moids.get(moid).map_or(false, |e| e.team == body.team);
                if same_team {
                    continue;
                }
            }
            return Some(MoHit {
                moid,
                point: Vec2::new(x as f32, y as f32),
            });
        }
        None
    }

    fn bounce(body: &MovableObject, material: MaterialId, scene: &dyn SceneQuery) -> (f32, f32) {
        match scene.material(material) {
            Some(m) => (body.restitution * m.restitution, (body.friction + m.friction) * 0.5),
            None => (body.restitution, body.friction),
        }
    }
}

impl Collider for AtomGroup {
    fn travel(&mut self, body: &mut MovableObject, ctx: &TravelContext) -> TravelOutcome {
        let mut outcome = TravelOutcome::default();
        let motion = body.vel * ctx.dt;
        let distance = motion.magnitude();
        let steps = (distance.ceil() as usize).clamp(1, MAX_STEPS);
        let mut step = motion / steps as f32;

        for _ in 0..steps {
            if step.x != 0.0 {
                let next = Vec2::new(body.pos.x + step.x, body.pos.y);
                match self.terrain_at(body, next, ctx.scene) {
                    Some(material) => {
                        let (restitution, _) = Self::bounce(body, material, ctx.scene);
                        body.vel.x = -body.vel.x * restitution;
                        step.x = 0.0;
                        outcome.terrain_hits += 1;
                        outcome.terrain_material = material;
                    }
                    None => body.pos.x = next.x,
                }
            }

            if step.y != 0.0 {
                let next = Vec2::new(body.pos.x, body.pos.y + step.y);
                match self.terrain_at(body, next, ctx.scene) {
                    Some(material) => {
                        let (restitution, friction) = Self::bounce(body, material, ctx.scene);
                        let landing = body.vel.y > 0.0;
                        body.vel.y = -body.vel.y * restitution;
                        if landing {
                            body.vel.x *= 1.0 - friction;
                            if ctx.allow_settle && body.vel.y.abs() < SETTLE_BOUNCE_SPEED {
                                body.vel.y = 0.0;
                            }
                        }
                        step.y = 0.0;
                        outcome.terrain_hits += 1;
                        outcome.terrain_material = material;
                    }
                    None => body.pos.y = next.y,
                }
            }

            if outcome.mo_hit.is_none() {
                outcome.mo_hit = self.mo_at(body, ctx);
            }

            if step.is_zero() {
                break;
            }
        }
        outcome
    }

    fn add_moid_to_ignore(&mut self, moid: Moid) {
        if !moid.is_none() && !self.ignored.contains(&moid) {
            self.ignored.push(moid);
        }
    }

    fn clear_moid_ignore_list(&mut self) {
        self.ignored.clear();
    }

    fn ignores_moid(&self, moid: Moid) -> bool {
        self.is_ignored(moid)
    }

    fn material(&self) -> MaterialId {
        self.material
    }

    fn atoms(&self) -> &[Vec2] {
        &self.atoms
    }
}
