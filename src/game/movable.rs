//! Movable Objects
//!
//! `MovableObject` is the one simulated body type. What an object can do is
//! decided by its kind tag plus the capabilities it carries:
//! - a `Joint` when it hangs off a parent (see `attachable`)
//! - a `Role` for turrets and legs, which own one extra part each
//! - a collider when it interacts with terrain and other objects
//!
//! The manager drives every root through `pre_travel`, `travel`,
//! `post_travel` and `update` once per frame, one phase at a time for all
//! objects. Attached children ride along inside their parent's calls.

use std::collections::HashSet;

use crate::config::SimConfig;
use crate::math::{Matrix, Vec2};
use crate::preset::{ObjectKind, PresetDef, GibDef};
use super::attachable::Joint;
use super::collision::{AtomGroup, Collider, TravelContext, TravelOutcome};
use super::entity::UniqueId;
use super::id_buffer::IdBuffer;
use super::leg::Leg;
use super::moid::Moid;
use super::scene::{MaterialId, SceneQuery, AIR, materials};
use super::script::ScriptHooks;
use super::shape::Shape;
use super::timer::Stopwatch;
use super::turret::Turret;

/// Mass never drops below this.
pub const MIN_MASS: f32 = 0.0001;

/// Rest threshold used when nothing else is configured.
pub const DEFAULT_REST_THRESHOLD_MS: f32 = 500.0;

/// Movement in either axis that counts as "not resting".
const REST_MOVE_THRESHOLD: f32 = 1.0;

/// Velocity reversals in a row before an object is told to settle.
const MAX_OSCILLATIONS: u32 = 2;

/// Mass, velocity and the force/impulse queues.
pub trait PhysicsBody {
    fn mass(&self) -> f32;
    fn vel(&self) -> Vec2;
    fn set_vel(&mut self, vel: Vec2);
    fn is_pinned(&self) -> bool;
    /// Queue a continuous force, applied scaled by delta time.
    fn add_force(&mut self, force: Vec2, offset: Vec2);
    /// Queue an impulse, applied as-is.
    fn add_impulse(&mut self, impulse: Vec2, offset: Vec2);

    fn momentum(&self) -> Vec2 {
        self.vel() * self.mass()
    }
}

/// Extra behaviour for kinds that own one special part.
#[derive(Debug, Default)]
pub enum Role {
    #[default]
    Plain,
    Turret(Turret),
    Leg(Leg),
}

impl Role {
    /// The owned part (mounted device or foot), if any.
    pub fn part(&self) -> Option<&MovableObject> {
        match self {
            Role::Plain => None,
            Role::Turret(t) => t.mounted.as_deref(),
            Role::Leg(l) => l.foot.as_deref(),
        }
    }

    pub fn part_mut(&mut self) -> Option<&mut MovableObject> {
        match self {
            Role::Plain => None,
            Role::Turret(t) => t.mounted.as_deref_mut(),
            Role::Leg(l) => l.foot.as_deref_mut(),
        }
    }

    /// Take the owned part out, leaving the slot empty.
    pub fn take_part(&mut self) -> Option<MovableObject> {
        match self {
            Role::Plain => None,
            Role::Turret(t) => t.mounted.take().map(|b| *b),
            Role::Leg(l) => l.foot.take().map(|b| *b),
        }
    }
}

/// Per-frame inputs for `MovableObject::update`.
pub struct UpdateContext<'a> {
    pub dt: f32,
    pub scene: &'a dyn SceneQuery,
}

#[derive(Debug)]
pub struct MovableObject {
    // Identity
    pub(crate) unique_id: UniqueId,
    pub(crate) kind: ObjectKind,
    pub(crate) preset_name: String,
    pub(crate) moid: Moid,
    pub(crate) root_moid: Moid,
    pub(crate) moid_footprint: usize,

    // Physical state
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: Matrix,
    pub angular_vel: f32,
    pub h_flipped: bool,
    pub(crate) prev_pos: Vec2,
    pub(crate) prev_vel: Vec2,
    pub(crate) scale: f32,
    pub(crate) mass: f32,
    pub(crate) global_acc_scalar: f32,
    pub(crate) air_resistance: f32,
    pub(crate) air_threshold: f32,
    pub(crate) pin_strength: f32,
    pub(crate) restitution: f32,
    pub(crate) friction: f32,

    // (force, application offset) pairs, drained every frame
    pub(crate) forces: Vec<(Vec2, Vec2)>,
    pub(crate) impulses: Vec<(Vec2, Vec2)>,

    // Lifecycle
    pub(crate) age: Stopwatch,
    pub(crate) rest_timer: Stopwatch,
    pub(crate) rest_threshold_ms: f32,
    pub(crate) oscillations: u32,
    pub(crate) lifetime_ms: f32,
    pub(crate) to_delete: bool,
    pub(crate) to_settle: bool,
    pub(crate) to_gib: bool,
    pub(crate) gib_impulse_limit: f32,
    pub(crate) updated: bool,
    pub(crate) mission_critical: bool,

    // Collision participation
    pub(crate) hits_mos: bool,
    pub(crate) gets_hit_by_mos: bool,
    pub(crate) ignores_team_hits: bool,
    pub(crate) ignores_atom_group_hits: bool,
    pub(crate) ignore_ag_hits_below_speed: f32,
    pub(crate) team: Option<u8>,
    /// Object whose MOIDs are skipped while travelling, e.g. the emitter
    pub(crate) ignore_uid: Option<UniqueId>,
    pub(crate) already_hit_by: HashSet<UniqueId>,

    // This frame's hit results
    pub(crate) hit_moid: Moid,
    pub(crate) hit_terrain_material: MaterialId,
    pub(crate) hit_particle_uid: UniqueId,
    pub(crate) hit_pos: Vec2,

    // Shape and drawing
    pub(crate) shape: Shape,
    pub(crate) silhouette: Vec<Vec2>,
    pub(crate) drawn_pixels: Vec<(i32, i32)>,
    pub(crate) material: MaterialId,
    pub(crate) collider: Option<Box<dyn Collider>>,

    // Composition
    pub(crate) joint: Option<Joint>,
    pub(crate) role: Role,
    pub(crate) attachables: Vec<Box<MovableObject>>,
    pub(crate) gibs: Vec<GibDef>,

    // Scripting
    pub(crate) scripts: Option<ScriptHooks>,
    pub(crate) script_created: bool,
}

impl MovableObject {
    /// A cleared object of the given kind: unit mass, point shape, no
    /// collider, not attached.
    pub fn new(kind: ObjectKind, unique_id: UniqueId) -> Self {
        let shape = Shape::Point;
        Self {
            unique_id,
            kind,
            preset_name: String::new(),
            moid: Moid::NONE,
            root_moid: Moid::NONE,
            moid_footprint: 0,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            rotation: Matrix::IDENTITY,
            angular_vel: 0.0,
            h_flipped: false,
            prev_pos: Vec2::ZERO,
            prev_vel: Vec2::ZERO,
            scale: 1.0,
            mass: 1.0,
            global_acc_scalar: 1.0,
            air_resistance: 0.0,
            air_threshold: 0.0,
            pin_strength: 0.0,
            restitution: 0.3,
            friction: 0.2,
            forces: Vec::new(),
            impulses: Vec::new(),
            age: Stopwatch::new(),
            rest_timer: Stopwatch::new(),
            rest_threshold_ms: DEFAULT_REST_THRESHOLD_MS,
            oscillations: 0,
            lifetime_ms: 0.0,
            to_delete: false,
            to_settle: false,
            to_gib: false,
            gib_impulse_limit: 0.0,
            updated: false,
            mission_critical: false,
            hits_mos: true,
            gets_hit_by_mos: true,
            ignores_team_hits: false,
            ignores_atom_group_hits: false,
            ignore_ag_hits_below_speed: 0.0,
            team: None,
            ignore_uid: None,
            already_hit_by: HashSet::new(),
            hit_moid: Moid::NONE,
            hit_terrain_material: AIR,
            hit_particle_uid: UniqueId::NONE,
            hit_pos: Vec2::ZERO,
            silhouette: shape.local_pixels(1.0),
            shape,
            drawn_pixels: Vec::new(),
            material: materials::SOIL,
            collider: None,
            joint: None,
            role: Role::Plain,
            attachables: Vec::new(),
            gibs: Vec::new(),
            scripts: None,
            script_created: false,
        }
    }

    /// Build an object from a preset record. Sub-parts are not resolved
    /// here; the registry mounts them afterwards.
    pub fn from_def(def: &PresetDef, kind: ObjectKind, unique_id: UniqueId, default_rest_ms: f32) -> Self {
        let mut obj = MovableObject::new(kind, unique_id);
        obj.preset_name = def.name.clone();

        let body = &def.body;
        obj.set_mass(body.mass);
        obj.scale = body.scale.max(0.0);
        obj.global_acc_scalar = body.global_acc_scalar;
        obj.air_resistance = body.air_resistance.max(0.0);
        obj.air_threshold = body.air_threshold;
        obj.pin_strength = body.pin_strength;
        obj.restitution = body.restitution.clamp(0.0, 1.0);
        obj.friction = body.friction.clamp(0.0, 1.0);
        obj.angular_vel = body.angular_vel;
        obj.gib_impulse_limit = body.gib_impulse_limit;

        let col = &def.collision;
        obj.hits_mos = col.hits_mos;
        obj.gets_hit_by_mos = col.gets_hit_by_mos;
        obj.ignores_team_hits = col.ignores_team_hits;
        obj.ignores_atom_group_hits = col.ignores_atom_group_hits;
        obj.ignore_ag_hits_below_speed = col.ignore_ag_hits_below_speed;

        obj.team = def.team;
        obj.material = def.material;
        obj.lifetime_ms = def.lifetime_ms.max(0.0);
        obj.rest_threshold_ms = def.rest_threshold_ms.unwrap_or(default_rest_ms);
        obj.mission_critical = def.mission_critical;
        obj.gibs = def.gibs.clone();
        obj.joint = def.joint.as_ref().map(Joint::from_def);

        obj.set_shape(def.shape.clone());
        let atoms = match &def.atoms {
            Some(atoms) => atoms.iter().map(|&a| a * obj.scale).collect(),
            None => obj.shape.default_atoms(obj.scale),
        };
        obj.collider = Some(Box::new(AtomGroup::new(atoms, def.material)));

        obj.role = match kind {
            ObjectKind::Turret => Role::Turret(Turret::from_def(&def.turret.clone().unwrap_or_default())),
            ObjectKind::Leg => Role::Leg(Leg::from_def(&def.leg.clone().unwrap_or_default())),
            _ => Role::Plain,
        };
        obj
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn unique_id(&self) -> UniqueId {
        self.unique_id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn preset_name(&self) -> &str {
        &self.preset_name
    }

    pub fn is_actor(&self) -> bool {
        self.kind == ObjectKind::Actor
    }

    pub fn team(&self) -> Option<u8> {
        self.team
    }

    pub fn set_team(&mut self, team: Option<u8>) {
        self.team = team;
    }

    // =========================================================================
    // Physical state
    // =========================================================================

    /// Own mass, without attached parts.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Non-positive or non-finite masses are replaced with `MIN_MASS`.
    pub fn set_mass(&mut self, mass: f32) {
        if !(mass > MIN_MASS) || !mass.is_finite() {
            if mass != MIN_MASS {
                log::warn!("{}: mass {} clamped to {}", self.unique_id, mass, MIN_MASS);
            }
            self.mass = MIN_MASS;
        } else {
            self.mass = mass;
        }
    }

    /// Mass of this object plus everything attached to it.
    pub fn total_mass(&self) -> f32 {
        self.mass + self.children().map(|c| c.total_mass()).sum::<f32>()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pin_strength(&self) -> f32 {
        self.pin_strength
    }

    pub fn set_pin_strength(&mut self, strength: f32) {
        self.pin_strength = strength;
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_strength > 0.0
    }

    pub fn set_global_acc_scalar(&mut self, scalar: f32) {
        self.global_acc_scalar = scalar;
    }

    pub fn set_air_resistance(&mut self, resistance: f32, threshold: f32) {
        self.air_resistance = resistance.max(0.0);
        self.air_threshold = threshold;
    }

    pub fn prev_pos(&self) -> Vec2 {
        self.prev_pos
    }

    pub fn prev_vel(&self) -> Vec2 {
        self.prev_vel
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Replace the shape and rebuild the drawn silhouette.
    pub fn set_shape(&mut self, shape: Shape) {
        self.silhouette = shape.local_pixels(self.scale);
        self.shape = shape;
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn set_collider(&mut self, collider: Box<dyn Collider>) {
        self.collider = Some(collider);
    }

    /// World pixels covered by this object's silhouette.
    pub fn silhouette_pixels(&self) -> Vec<(i32, i32)> {
        super::shape::world_pixels(&self.silhouette, self.pos, &self.rotation, self.h_flipped)
    }

    // =========================================================================
    // Forces and impulses
    // =========================================================================

    pub fn add_force(&mut self, force: Vec2, offset: Vec2) {
        self.forces.push((force, offset));
    }

    pub fn add_impulse(&mut self, impulse: Vec2, offset: Vec2) {
        self.impulses.push((impulse, offset));
    }

    pub fn forces(&self) -> &[(Vec2, Vec2)] {
        &self.forces
    }

    pub fn impulses(&self) -> &[(Vec2, Vec2)] {
        &self.impulses
    }

    /// Integrate gravity, air drag and queued forces into velocity.
    pub fn apply_forces(&mut self, global_acc: Vec2, dt: f32) {
        if self.is_pinned() {
            self.forces.clear();
            return;
        }

        self.vel += global_acc * self.global_acc_scalar * dt;

        if self.air_resistance > 0.0 && self.vel.magnitude() > self.air_threshold {
            self.vel = self.vel * (1.0 - self.air_resistance * dt).max(0.0);
        }

        let mass = self.total_mass();
        for (force, _) in self.forces.drain(..) {
            self.vel += force / mass * dt;
        }
    }

    /// Integrate queued impulses into velocity. A large enough total marks
    /// the object for gibbing.
    pub fn apply_impulses(&mut self) {
        if self.is_pinned() {
            self.impulses.clear();
            return;
        }

        let mass = self.total_mass();
        let mut total = Vec2::ZERO;
        for (impulse, _) in self.impulses.drain(..) {
            total += impulse;
            self.vel += impulse / mass;
        }

        if self.gib_impulse_limit > 0.0 && total.magnitude() > self.gib_impulse_limit {
            log::debug!("{} takes impulse {:.1}, gibbing", self.unique_id, total.magnitude());
            self.to_gib = true;
        }
    }

    // =========================================================================
    // Frame phases
    // =========================================================================

    /// Erase the old silhouette, snapshot motion, reset hit scratch.
    pub fn pre_travel(&mut self, ids: &mut IdBuffer, config: &SimConfig) {
        if config.precise_collisions && self.gets_hit_by_mos {
            ids.erase_tree(self);
        }
        self.begin_frame(config.delta_time);
    }

    fn begin_frame(&mut self, dt: f32) {
        self.age.tick(dt);
        self.rest_timer.tick(dt);
        self.prev_pos = self.pos;
        self.prev_vel = self.vel;
        self.hit_moid = Moid::NONE;
        self.hit_terrain_material = AIR;
        self.hit_particle_uid = UniqueId::NONE;
        self.updated = false;
        if let Some(collider) = self.collider.as_mut() {
            collider.clear_moid_ignore_list();
        }
        for child in self.children_mut() {
            child.begin_frame(dt);
        }
    }

    /// Integrate forces and move through the scene.
    pub fn travel(&mut self, ctx: &TravelContext) -> TravelOutcome {
        self.apply_forces(ctx.global_acc, ctx.dt);
        self.apply_impulses();

        if self.is_pinned() {
            return TravelOutcome::default();
        }

        let outcome = match self.collider.take() {
            Some(mut collider) => {
                let outcome = collider.travel(self, ctx);
                self.collider = Some(collider);
                outcome
            }
            None => {
                self.pos += self.vel * ctx.dt;
                TravelOutcome::default()
            }
        };

        let angle = self.rotation.angle() + self.angular_vel * ctx.dt;
        self.rotation.set_angle(angle);

        self.hit_terrain_material = outcome.terrain_material;
        if let Some(hit) = &outcome.mo_hit {
            self.hit_moid = hit.moid;
            self.hit_pos = hit.point;
        }
        outcome
    }

    /// Redraw, age out, bounds check, fix velocity, detect rest.
    pub fn post_travel(&mut self, ids: &mut IdBuffer, scene: &dyn SceneQuery, config: &SimConfig) {
        if self.ignore_ag_hits_below_speed > 0.0 {
            self.ignores_atom_group_hits = self.vel.magnitude() < self.ignore_ag_hits_below_speed;
        }

        if self.gets_hit_by_mos {
            if config.precise_collisions {
                ids.draw_tree(self);
            }
            self.already_hit_by.clear();
        }

        self.updated = true;

        if self.is_expired() {
            self.to_delete = true;
        }

        scene.wrap_point(&mut self.pos);
        if !scene.is_within_bounds(self.pos, config.out_of_bounds_margin) {
            log::debug!("{} left the scene at ({:.0}, {:.0})", self.unique_id, self.pos.x, self.pos.y);
            self.to_delete = true;
        }

        if !self.vel.is_finite() {
            log::warn!("{}: non-finite velocity reset", self.unique_id);
            self.vel = Vec2::ZERO;
        }
        if self.vel.magnitude() > config.max_velocity {
            self.vel = self.vel.with_magnitude(config.max_velocity);
        }

        self.rest_detection();
        if config.settle_enabled && self.is_at_rest() {
            self.to_settle = true;
        }
        if self.mission_critical || !config.settle_enabled || !self.can_settle() {
            self.to_settle = false;
        }
    }

    /// Track oscillation and movement against last frame's snapshot.
    pub fn rest_detection(&mut self) {
        if self.is_pinned() {
            return;
        }

        if self.vel.dot(self.prev_vel) < 0.0 {
            self.oscillations += 1;
        } else {
            self.oscillations = 0;
        }
        if self.oscillations > MAX_OSCILLATIONS && self.rest_threshold_ms >= 0.0 {
            self.to_settle = true;
        }

        let moved = self.pos - self.prev_pos;
        if moved.x.abs() >= REST_MOVE_THRESHOLD || moved.y.abs() >= REST_MOVE_THRESHOLD {
            self.rest_timer.reset();
        }
    }

    /// Never true for pinned objects or a negative threshold.
    pub fn is_at_rest(&self) -> bool {
        if self.is_pinned() || self.rest_threshold_ms < 0.0 {
            return false;
        }
        self.rest_timer.is_past_ms(self.rest_threshold_ms as f64)
    }

    /// Actors and attached parts stay simulated.
    fn can_settle(&self) -> bool {
        self.kind != ObjectKind::Actor && !self.is_attached()
    }

    /// Scripts, role behaviour, then attached children. Returns parts whose
    /// joints broke this frame; they are no longer owned by this object.
    pub fn update(&mut self, ctx: &UpdateContext) -> Vec<MovableObject> {
        self.run_update_script();

        let mut released = Vec::new();
        match self.role {
            Role::Turret(_) => self.update_turret(ctx, &mut released),
            Role::Leg(_) => self.update_leg(ctx, &mut released),
            Role::Plain => {}
        }
        self.update_attachables(ctx, &mut released);
        released
    }

    /// Tear down script state for the whole subtree.
    pub fn destroy(&mut self) {
        self.run_destroy_script();
        for child in self.children_mut() {
            child.destroy();
        }
    }

    // =========================================================================
    // Lifecycle flags
    // =========================================================================

    pub fn age_ms(&self) -> f64 {
        self.age.elapsed_ms()
    }

    pub fn set_age_ms(&mut self, ms: f64) {
        self.age.set_elapsed_ms(ms);
    }

    pub fn lifetime_ms(&self) -> f32 {
        self.lifetime_ms
    }

    /// Lived past a non-zero lifetime.
    pub fn is_expired(&self) -> bool {
        self.lifetime_ms > 0.0 && self.age.is_past_ms(self.lifetime_ms as f64)
    }

    /// 0 = lives forever
    pub fn set_lifetime_ms(&mut self, ms: f32) {
        self.lifetime_ms = ms.max(0.0);
    }

    pub fn rest_threshold_ms(&self) -> f32 {
        self.rest_threshold_ms
    }

    /// Negative disables rest detection.
    pub fn set_rest_threshold_ms(&mut self, ms: f32) {
        self.rest_threshold_ms = ms;
    }

    pub fn rest_ms(&self) -> f64 {
        self.rest_timer.elapsed_ms()
    }

    pub fn to_delete(&self) -> bool {
        self.to_delete
    }

    pub fn set_to_delete(&mut self, to_delete: bool) {
        self.to_delete = to_delete;
    }

    pub fn to_settle(&self) -> bool {
        self.to_settle
    }

    pub fn set_to_settle(&mut self, to_settle: bool) {
        self.to_settle = to_settle;
    }

    pub fn to_gib(&self) -> bool {
        self.to_gib
    }

    pub fn set_to_gib(&mut self, to_gib: bool) {
        self.to_gib = to_gib;
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn is_mission_critical(&self) -> bool {
        self.mission_critical
    }

    pub fn set_mission_critical(&mut self, critical: bool) {
        self.mission_critical = critical;
    }

    // =========================================================================
    // Collision participation
    // =========================================================================

    pub fn hits_mos(&self) -> bool {
        self.hits_mos
    }

    pub fn set_hits_mos(&mut self, hits: bool) {
        self.hits_mos = hits;
    }

    pub fn set_gets_hit_by_mos(&mut self, gets_hit: bool) {
        self.gets_hit_by_mos = gets_hit;
    }

    pub fn ignores_team_hits(&self) -> bool {
        self.ignores_team_hits
    }

    pub fn set_ignores_team_hits(&mut self, ignores: bool) {
        self.ignores_team_hits = ignores;
    }

    pub fn ignores_atom_group_hits(&self) -> bool {
        self.ignores_atom_group_hits
    }

    pub fn set_ignores_atom_group_hits(&mut self, ignores: bool) {
        self.ignores_atom_group_hits = ignores;
    }

    /// 0 turns the automatic toggle off.
    pub fn set_ignore_ag_hits_below_speed(&mut self, speed: f32) {
        self.ignore_ag_hits_below_speed = speed;
    }

    pub fn ignore_uid(&self) -> Option<UniqueId> {
        self.ignore_uid
    }

    /// Skip hits against this object (and its parts) while travelling.
    pub fn set_ignore_uid(&mut self, uid: Option<UniqueId>) {
        self.ignore_uid = uid;
    }

    pub fn add_moid_to_ignore(&mut self, moid: Moid) {
        if let Some(collider) = self.collider.as_mut() {
            collider.add_moid_to_ignore(moid);
        }
    }

    pub fn ignores_moid(&self, moid: Moid) -> bool {
        self.collider.as_ref().map_or(false, |c| c.ignores_moid(moid))
    }

    pub fn was_hit_by(&self, uid: UniqueId) -> bool {
        self.already_hit_by.contains(&uid)
    }

    pub(crate) fn record_hit_by(&mut self, uid: UniqueId) -> bool {
        self.already_hit_by.insert(uid)
    }

    pub fn hit_moid(&self) -> Moid {
        self.hit_moid
    }

    pub fn hit_terrain_material(&self) -> MaterialId {
        self.hit_terrain_material
    }

    pub fn hit_particle_uid(&self) -> UniqueId {
        self.hit_particle_uid
    }

    // =========================================================================
    // Tree access
    // =========================================================================

    /// Directly owned parts: the role part first, then attachables.
    pub fn children(&self) -> impl Iterator<Item = &MovableObject> {
        self.role.part().into_iter().chain(self.attachables.iter().map(|b| b.as_ref()))
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut MovableObject> {
        self.role
            .part_mut()
            .into_iter()
            .chain(self.attachables.iter_mut().map(|b| b.as_mut()))
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Depth-first search of this subtree.
    pub fn find(&self, uid: UniqueId) -> Option<&MovableObject> {
        if self.unique_id == uid {
            return Some(self);
        }
        self.children().find_map(|c| c.find(uid))
    }

    pub fn find_mut(&mut self, uid: UniqueId) -> Option<&mut MovableObject> {
        if self.unique_id == uid {
            return Some(self);
        }
        self.children_mut().find_map(|c| c.find_mut(uid))
    }

    /// Move the object and everything attached to it.
    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
        self.prev_pos += delta;
        if let Some(joint) = self.joint.as_mut() {
            joint.joint_pos += delta;
        }
        for child in self.children_mut() {
            child.translate(delta);
        }
    }

    /// Number of objects in this subtree including self.
    pub fn tree_size(&self) -> usize {
        1 + self.children().map(|c| c.tree_size()).sum::<usize>()
    }
}

impl PhysicsBody for MovableObject {
    fn mass(&self) -> f32 {
        self.total_mass()
    }

    fn vel(&self) -> Vec2 {
        self.vel
    }

    fn set_vel(&mut self, vel: Vec2) {
        self.vel = vel;
    }

    fn is_pinned(&self) -> bool {
        self.pin_strength > 0.0
    }

    fn add_force(&mut self, force: Vec2, offset: Vec2) {
        MovableObject::add_force(self, force, offset);
    }

    fn add_impulse(&mut self, impulse: Vec2, offset: Vec2) {
        MovableObject::add_impulse(self, impulse, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::UniqueIds;
    use crate::game::scene::Scene;

    fn object() -> MovableObject {
        MovableObject::new(ObjectKind::Rotating, UniqueIds::new().next_id())
    }

    fn setup() -> (IdBuffer, Scene, SimConfig) {
        let config = SimConfig::default();
        (
            IdBuffer::new(config.scene_width, config.scene_height, false),
            Scene::new(config.scene_width, config.scene_height, false),
            config,
        )
    }

    #[test]
    fn test_mass_is_clamped() {
        let mut obj = object();
        obj.set_mass(0.0);
        assert!(obj.mass() > 0.0);
        assert_eq!(obj.mass(), MIN_MASS);
        obj.set_mass(-5.0);
        assert_eq!(obj.mass(), MIN_MASS);
        obj.set_mass(f32::NAN);
        assert_eq!(obj.mass(), MIN_MASS);
        obj.set_mass(3.0);
        assert_eq!(obj.mass(), 3.0);
    }

    #[test]
    fn test_gravity_integration() {
        let mut obj = object();
        obj.apply_forces(Vec2::new(0.0, 10.0), 0.1);
        assert!(obj.vel.x.abs() < 1e-6);
        assert!((obj.vel.y - 1.0).abs() < 1e-5);
        assert_eq!(obj.pos, Vec2::ZERO);
    }

    #[test]
    fn test_pinned_ignores_forces_and_impulses() {
        let mut obj = object();
        obj.set_pin_strength(1.0);
        obj.vel = Vec2::new(1.0, 2.0);
        obj.add_force(Vec2::new(100.0, 0.0), Vec2::ZERO);
        obj.add_impulse(Vec2::new(0.0, 100.0), Vec2::ZERO);

        obj.apply_forces(Vec2::new(0.0, 10.0), 0.1);
        obj.apply_impulses();

        assert_eq!(obj.vel, Vec2::new(1.0, 2.0));
        assert!(obj.forces().is_empty());
        assert!(obj.impulses().is_empty());
    }

    #[test]
    fn test_impulse_and_force_differ_by_dt() {
        let dt = 0.25;
        let f = Vec2::new(8.0, 0.0);

        let mut pushed = object();
        pushed.set_mass(2.0);
        pushed.add_force(f, Vec2::ZERO);
        pushed.apply_forces(Vec2::ZERO, dt);

        let mut kicked = object();
        kicked.set_mass(2.0);
        kicked.add_impulse(f, Vec2::ZERO);
        kicked.apply_impulses();

        assert!((kicked.vel.x - 4.0).abs() < 1e-5);
        assert!((pushed.vel.x - 1.0).abs() < 1e-5);
        assert!((pushed.vel.x - kicked.vel.x * dt).abs() < 1e-5);
    }

    #[test]
    fn test_air_resistance_above_threshold() {
        let mut obj = object();
        obj.set_air_resistance(0.5, 1.0);
        obj.vel = Vec2::new(10.0, 0.0);
        obj.apply_forces(Vec2::ZERO, 0.1);
        assert!((obj.vel.x - 9.5).abs() < 1e-4);

        obj.vel = Vec2::new(0.5, 0.0);
        obj.apply_forces(Vec2::ZERO, 0.1);
        assert!((obj.vel.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_big_impulse_marks_gib() {
        let mut obj = object();
        obj.gib_impulse_limit = 10.0;
        obj.add_impulse(Vec2::new(20.0, 0.0), Vec2::ZERO);
        obj.apply_impulses();
        assert!(obj.to_gib());
    }

    #[test]
    fn test_rest_after_threshold() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(100.0, 100.0);
        obj.set_rest_threshold_ms(100.0);

        for _ in 0..10 {
            obj.pre_travel(&mut ids, &config);
            obj.post_travel(&mut ids, &scene, &config);
        }
        assert!(obj.rest_ms() > 100.0);
        assert!(obj.is_at_rest());
        assert!(obj.to_settle());
    }

    #[test]
    fn test_pinned_never_rests() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(100.0, 100.0);
        obj.set_pin_strength(1.0);
        obj.set_rest_threshold_ms(10.0);

        for _ in 0..120 {
            obj.pre_travel(&mut ids, &config);
            obj.post_travel(&mut ids, &scene, &config);
        }
        assert!(!obj.is_at_rest());
        assert!(!obj.to_settle());
    }

    #[test]
    fn test_negative_threshold_disables_rest() {
        let mut obj = object();
        obj.set_rest_threshold_ms(-1.0);
        obj.rest_timer.set_elapsed_ms(1.0e6);
        assert!(!obj.is_at_rest());
    }

    #[test]
    fn test_movement_resets_rest_timer() {
        let mut obj = object();
        obj.rest_timer.set_elapsed_ms(400.0);
        obj.prev_pos = Vec2::ZERO;
        obj.pos = Vec2::new(0.0, 1.5);
        obj.rest_detection();
        assert_eq!(obj.rest_ms(), 0.0);
    }

    #[test]
    fn test_oscillation_flags_settle() {
        let mut obj = object();
        for i in 0..3 {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            obj.prev_vel = Vec2::new(dir, 0.0);
            obj.vel = Vec2::new(-dir, 0.0);
            obj.rest_detection();
        }
        assert!(obj.to_settle());
    }

    #[test]
    fn test_oscillation_ignored_when_rest_disabled() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(100.0, 100.0);
        obj.set_rest_threshold_ms(-1.0);

        for i in 0..4 {
            obj.pre_travel(&mut ids, &config);
            obj.vel = Vec2::new(if i % 2 == 0 { 0.1 } else { -0.1 }, 0.0);
            obj.post_travel(&mut ids, &scene, &config);
        }
        assert!(obj.oscillations > MAX_OSCILLATIONS);
        assert!(!obj.is_at_rest());
        assert!(!obj.to_settle());
    }

    #[test]
    fn test_lifetime_expiry() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(50.0, 50.0);
        obj.set_lifetime_ms(1000.0);
        obj.set_age_ms(1001.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert!(obj.to_delete());
    }

    #[test]
    fn test_out_of_bounds_is_deleted() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(-config.out_of_bounds_margin - 10.0, 10.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert!(obj.to_delete());
    }

    #[test]
    fn test_runaway_velocity_fixed() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(50.0, 50.0);
        obj.vel = Vec2::new(f32::NAN, 1.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert_eq!(obj.vel, Vec2::ZERO);

        obj.vel = Vec2::new(config.max_velocity * 3.0, 0.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert!((obj.vel.magnitude() - config.max_velocity).abs() < 1e-2);
    }

    #[test]
    fn test_mission_critical_never_settles() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(50.0, 50.0);
        obj.set_mission_critical(true);
        obj.set_rest_threshold_ms(0.0);
        obj.rest_timer.set_elapsed_ms(100.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert!(!obj.to_settle());
    }

    #[test]
    fn test_ag_hits_toggle_by_speed() {
        let (mut ids, scene, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(50.0, 50.0);
        obj.set_ignore_ag_hits_below_speed(5.0);
        obj.vel = Vec2::new(1.0, 0.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert!(obj.ignores_atom_group_hits());
        obj.vel = Vec2::new(10.0, 0.0);
        obj.post_travel(&mut ids, &scene, &config);
        assert!(!obj.ignores_atom_group_hits());
    }

    #[test]
    fn test_pre_travel_snapshots_and_resets() {
        let (mut ids, _, config) = setup();
        let mut obj = object();
        obj.pos = Vec2::new(3.0, 4.0);
        obj.vel = Vec2::new(1.0, 0.0);
        obj.hit_moid = Moid::new(7);
        obj.pre_travel(&mut ids, &config);
        assert_eq!(obj.prev_pos(), Vec2::new(3.0, 4.0));
        assert_eq!(obj.prev_vel(), Vec2::new(1.0, 0.0));
        assert!(obj.hit_moid().is_none());
    }
}
