//! Presets
//!
//! Class metadata, preset records and the registry that clones objects
//! from them.

pub mod class;
pub mod def;
pub mod registry;

pub use class::{class_info, is_a, ObjectKind};
pub use def::{AttachmentDef, GibDef, JointDef, LegDef, PresetDef, PresetFile, PresetRef, TurretDef};
pub use registry::PresetRegistry;
