//! Simulation Core
//!
//! Movable objects and the frame that drives them.
//!
//! Key concepts:
//! - MovableObject: one struct for every kind, with attachment and role
//!   parts owned as a tree
//! - MOID: per-frame numbering of hit-detectable objects, rasterized into
//!   an id-buffer for pixel-accurate object hits
//! - MovableMan: owner of free objects, addressed by generational handles
//! - SimWorld: everything a frame needs, passed explicitly
//! - Event: what happened during a frame, for game code to read

pub mod entity;
pub mod component;
pub mod timer;
pub mod shape;
pub mod scene;
pub mod moid;
pub mod id_buffer;
pub mod collision;
pub mod movable;
pub mod attachable;
pub mod turret;
pub mod leg;
pub mod gib;
pub mod script;
pub mod event;
pub mod manager;
pub mod world;

pub use attachable::Joint;
pub use collision::{AtomGroup, Collider};
pub use entity::{MoHandle, UniqueId, UniqueIds};
pub use event::Events;
pub use id_buffer::IdBuffer;
pub use manager::MovableMan;
pub use moid::{HitTarget, Moid, MoidIndex};
pub use movable::{MovableObject, PhysicsBody, Role};
pub use scene::{Material, MaterialId, Scene, SceneQuery};
pub use script::ScriptHooks;
pub use shape::Shape;
pub use world::{FrameStats, SimWorld};
