//! Gibbing
//!
//! Violent destruction: owned parts are thrown clear, the preset's gib
//! list is spawned around the object, and the object is marked for
//! deletion. The returned objects are free bodies for the manager to adopt.

use std::f32::consts::FRAC_PI_2;

use rand::Rng;

use crate::math::Vec2;
use crate::preset::PresetRegistry;
use super::entity::UniqueIds;
use super::movable::MovableObject;

/// Speed a released part is thrown away from the centre with.
const PART_FLING_SPEED: f32 = 20.0;

impl MovableObject {
    /// Break apart. Returns released parts followed by spawned gibs.
    pub fn gib_this(&mut self, presets: &PresetRegistry, ids: &mut UniqueIds, rng: &mut impl Rng) -> Vec<MovableObject> {
        let center = self.pos;
        let vel = self.vel;
        let mut debris = Vec::new();

        if let Some(part) = self.role.take_part() {
            debris.push(fling(part, center, vel));
        }
        for child in self.attachables.drain(..) {
            debris.push(fling(*child, center, vel));
        }

        for gib in &self.gibs {
            let (lo, hi) = (gib.min_velocity.min(gib.max_velocity), gib.min_velocity.max(gib.max_velocity));
            let spread = gib.spread.abs();
            for _ in 0..gib.count {
                match presets.instantiate_ref(&gib.preset, ids) {
                    Ok(mut piece) => {
                        let angle = -FRAC_PI_2 + rng.gen_range(-spread..=spread);
                        let speed = rng.gen_range(lo..=hi);
                        piece.pos = center;
                        piece.vel = vel + Vec2::new(angle.cos(), angle.sin()) * speed;
                        piece.h_flipped = self.h_flipped;
                        debris.push(piece);
                    }
                    Err(e) => {
                        log::warn!("{}: gib '{}' skipped: {}", self.unique_id, gib.preset.name, e);
                        break;
                    }
                }
            }
        }

        log::debug!("{} gibbed into {} pieces", self.unique_id, debris.len());
        self.to_gib = false;
        self.to_delete = true;
        debris
    }
}

/// Cut a part loose and push it away from `center`.
fn fling(mut part: MovableObject, center: Vec2, vel: Vec2) -> MovableObject {
    part.detach();
    let away = part.pos - center;
    let dir = if away.is_zero() { Vec2::new(0.0, -1.0) } else { away.normalize() };
    part.vel = vel;
    let mass = part.total_mass();
    part.add_impulse(dir * PART_FLING_SPEED * mass, Vec2::ZERO);
    part
}
