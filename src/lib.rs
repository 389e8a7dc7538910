//! debris
//!
//! Movable-object simulation core for a 2D pixel action game: particles,
//! rigid bodies and actors with attached parts, pixel-accurate object hits
//! through a MOID raster, and settling of debris into destructible terrain.
//!
//! ```no_run
//! use debris::{SimConfig, SimWorld};
//!
//! let mut world = SimWorld::new(SimConfig::default());
//! world.presets.load_dir("data").unwrap();
//! world.spawn("Actor", "Crab", None, debris::Vec2::new(320.0, 100.0)).unwrap();
//! for _ in 0..60 {
//!     world.step();
//! }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod math;
pub mod preset;

pub use config::SimConfig;
pub use error::{ConfigError, DebrisError, PresetError, Result};
pub use game::{MovableObject, SimWorld};
pub use math::Vec2;
pub use preset::{ObjectKind, PresetRegistry};
