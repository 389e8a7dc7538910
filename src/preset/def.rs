//! Preset Definitions
//!
//! Serde records for preset files. Every block has defaults so a preset
//! only spells out what differs, e.g.:
//!
//! ```text
//! (
//!     module: "Base",
//!     presets: [
//!         (class: "MOSRotating", name: "Crate", shape: Rect(half_w: 4.0, half_h: 4.0)),
//!     ],
//! )
//! ```

use std::f32::consts::PI;

use serde::{Serialize, Deserialize};

use crate::game::scene::{MaterialId, materials};
use crate::game::shape::Shape;
use crate::math::Vec2;

/// By-name reference to another preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRef {
    pub class: String,
    pub name: String,
    /// `None` searches modules newest first
    #[serde(default)]
    pub module: Option<String>,
}

impl PresetRef {
    pub fn new(class: &str, name: &str) -> Self {
        Self {
            class: class.to_string(),
            name: name.to_string(),
            module: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDef {
    pub mass: f32,
    pub scale: f32,
    pub global_acc_scalar: f32,
    pub air_resistance: f32,
    /// Speed below which air resistance is not applied
    pub air_threshold: f32,
    pub pin_strength: f32,
    pub restitution: f32,
    pub friction: f32,
    pub angular_vel: f32,
    /// Impulse magnitude in one frame that gibs the object (0 = never)
    pub gib_impulse_limit: f32,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            mass: 1.0,
            scale: 1.0,
            global_acc_scalar: 1.0,
            air_resistance: 0.0,
            air_threshold: 5.0,
            pin_strength: 0.0,
            restitution: 0.3,
            friction: 0.2,
            angular_vel: 0.0,
            gib_impulse_limit: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionDef {
    pub hits_mos: bool,
    pub gets_hit_by_mos: bool,
    pub ignores_team_hits: bool,
    pub ignores_atom_group_hits: bool,
    /// Below this speed atom group hits are ignored (0 = off)
    pub ignore_ag_hits_below_speed: f32,
}

impl Default for CollisionDef {
    fn default() -> Self {
        Self {
            hits_mos: true,
            gets_hit_by_mos: true,
            ignores_team_hits: false,
            ignores_atom_group_hits: false,
            ignore_ag_hits_below_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JointDef {
    /// Where the joint sits on the parent, in parent space
    pub parent_offset: Vec2,
    /// Where the joint sits on this object, in own space
    pub joint_offset: Vec2,
    pub rotation_offset: f32,
    /// Impulse that breaks the joint (0 = unbreakable)
    pub joint_strength: f32,
    /// Share of forces passed on to the parent
    pub joint_stiffness: f32,
    pub draw_after_parent: bool,
    pub inherits_hflip: bool,
    /// Take a MOID of its own instead of sharing the previous slot
    pub new_moid: bool,
}

impl Default for JointDef {
    fn default() -> Self {
        Self {
            parent_offset: Vec2::ZERO,
            joint_offset: Vec2::ZERO,
            rotation_offset: 0.0,
            joint_strength: 0.0,
            joint_stiffness: 1.0,
            draw_after_parent: true,
            inherits_hflip: true,
            new_moid: true,
        }
    }
}

/// A sub-part mounted on the parent at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentDef {
    pub preset: PresetRef,
    /// Overrides the child's own `joint.parent_offset`
    #[serde(default)]
    pub offset: Option<Vec2>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretDef {
    pub mounted: Option<PresetRef>,
    pub mounted_offset: Vec2,
    pub mounted_rotation_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegDef {
    pub foot: Option<PresetRef>,
    pub min_extension: f32,
    pub max_extension: f32,
    /// Fraction of the remaining distance covered per update
    pub move_speed: f32,
    pub idle_offset: Vec2,
    pub will_idle: bool,
    pub frame_count: u32,
    pub contracted_angle: f32,
    pub extended_angle: f32,
}

impl Default for LegDef {
    fn default() -> Self {
        Self {
            foot: None,
            min_extension: 4.0,
            max_extension: 12.0,
            move_speed: 0.5,
            idle_offset: Vec2::new(0.0, 10.0),
            will_idle: true,
            frame_count: 1,
            contracted_angle: 0.0,
            extended_angle: 0.0,
        }
    }
}

/// Debris spawned when an object gibs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GibDef {
    pub preset: PresetRef,
    #[serde(default = "default_gib_count")]
    pub count: u32,
    #[serde(default)]
    pub min_velocity: f32,
    #[serde(default = "default_gib_velocity")]
    pub max_velocity: f32,
    /// Half-angle of the spray cone around straight up, radians
    #[serde(default = "default_gib_spread")]
    pub spread: f32,
}

fn default_gib_count() -> u32 {
    1
}

fn default_gib_velocity() -> f32 {
    30.0
}

fn default_gib_spread() -> f32 {
    PI
}

fn default_material() -> MaterialId {
    materials::SOIL
}

/// One preset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDef {
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: BodyDef,
    #[serde(default)]
    pub collision: CollisionDef,
    #[serde(default)]
    pub shape: Shape,
    /// Explicit collision atoms; derived from the shape when absent
    #[serde(default)]
    pub atoms: Option<Vec<Vec2>>,
    #[serde(default = "default_material")]
    pub material: MaterialId,
    #[serde(default)]
    pub team: Option<u8>,
    /// Milliseconds, 0 = infinite
    #[serde(default)]
    pub lifetime_ms: f32,
    /// Falls back to the simulation default
    #[serde(default)]
    pub rest_threshold_ms: Option<f32>,
    #[serde(default)]
    pub mission_critical: bool,
    #[serde(default)]
    pub gibs: Vec<GibDef>,
    #[serde(default)]
    pub joint: Option<JointDef>,
    #[serde(default)]
    pub attachables: Vec<AttachmentDef>,
    #[serde(default)]
    pub turret: Option<TurretDef>,
    #[serde(default)]
    pub leg: Option<LegDef>,
}

impl PresetDef {
    /// Bare preset with every block at its default.
    pub fn new(class: &str, name: &str) -> Self {
        Self {
            class: class.to_string(),
            name: name.to_string(),
            description: String::new(),
            body: BodyDef::default(),
            collision: CollisionDef::default(),
            shape: Shape::default(),
            atoms: None,
            material: default_material(),
            team: None,
            lifetime_ms: 0.0,
            rest_threshold_ms: None,
            mission_critical: false,
            gibs: Vec::new(),
            joint: None,
            attachables: Vec::new(),
            turret: None,
            leg: None,
        }
    }

    /// Every preset this one refers to by name.
    pub fn references(&self) -> impl Iterator<Item = &PresetRef> {
        self.attachables
            .iter()
            .map(|a| &a.preset)
            .chain(self.gibs.iter().map(|g| &g.preset))
            .chain(self.turret.iter().filter_map(|t| t.mounted.as_ref()))
            .chain(self.leg.iter().filter_map(|l| l.foot.as_ref()))
    }
}

/// Top-level preset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetFile {
    pub module: String,
    #[serde(default)]
    pub presets: Vec<PresetDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_preset_parses_with_defaults() {
        let src = r#"(
            module: "Base",
            presets: [
                (class: "MOPixel", name: "Spark"),
            ],
        )"#;
        let file: PresetFile = ron::from_str(src).unwrap();
        assert_eq!(file.module, "Base");
        let spark = &file.presets[0];
        assert_eq!(spark.body.mass, 1.0);
        assert!(spark.collision.gets_hit_by_mos);
        assert!(spark.joint.is_none());
        assert_eq!(spark.material, materials::SOIL);
    }

    #[test]
    fn test_turret_preset_parses() {
        let src = r#"(
            class: "Turret",
            name: "Mount",
            shape: Rect(half_w: 2.0, half_h: 2.0),
            joint: Some((parent_offset: (x: 0.0, y: -4.0))),
            turret: Some((
                mounted: Some((class: "HeldDevice", name: "Gun")),
                mounted_offset: (x: 3.0, y: 0.0),
            )),
        )"#;
        let def: PresetDef = ron::from_str(src).unwrap();
        let turret = def.turret.as_ref().unwrap();
        assert_eq!(turret.mounted.as_ref().unwrap().name, "Gun");
        assert_eq!(def.joint.as_ref().unwrap().joint_stiffness, 1.0);
        assert_eq!(def.references().count(), 1);
    }
}
