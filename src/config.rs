//! Simulation settings
//!
//! Stored as RON next to the preset files. Every field has a default so a
//! settings file only needs to list what it changes.

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::ConfigError;
use crate::math::Vec2;

/// Tunables for one simulation world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed step in seconds
    pub delta_time: f32,
    /// Gravity in pixels per second squared (+Y is down)
    pub global_acceleration: Vec2,
    /// Erase and redraw silhouettes in the id-buffer during travel
    pub precise_collisions: bool,
    /// How far outside the scene an object may go before it is deleted
    pub out_of_bounds_margin: f32,
    /// Speed cap in pixels per second; faster objects are slowed to this
    pub max_velocity: f32,
    /// Allow objects at rest to be baked into terrain
    pub settle_enabled: bool,
    /// Default rest threshold in ms for presets that don't set one (negative disables)
    pub rest_threshold_ms: f32,
    /// Share of a hitter's momentum handed to the object it hits
    pub mo_hit_transfer: f32,
    /// Seed for gib spread and other randomised effects
    pub seed: u64,
    /// Scene size in pixels
    pub scene_width: u32,
    pub scene_height: u32,
    /// Whether the scene wraps horizontally
    pub wrap_x: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            global_acceleration: Vec2::new(0.0, 20.0),
            precise_collisions: true,
            out_of_bounds_margin: 100.0,
            max_velocity: 2000.0,
            settle_enabled: true,
            rest_threshold_ms: 500.0,
            mo_hit_transfer: 0.5,
            seed: 0x5eed,
            scene_width: 640,
            scene_height: 360,
            wrap_x: false,
        }
    }
}

impl SimConfig {
    /// Parse settings from a RON string and validate them.
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> String {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
        // Plain data with no maps keyed by non-strings; serialization can't fail
        ron::ser::to_string_pretty(self, pretty).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.delta_time > 0.0 && self.delta_time.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "delta_time",
                reason: format!("must be positive and finite, got {}", self.delta_time),
            });
        }
        if !self.global_acceleration.is_finite() {
            return Err(ConfigError::Invalid {
                field: "global_acceleration",
                reason: "must be finite".to_string(),
            });
        }
        if self.scene_width == 0 || self.scene_height == 0 {
            return Err(ConfigError::Invalid {
                field: "scene_width",
                reason: format!("scene must be non-empty, got {}x{}", self.scene_width, self.scene_height),
            });
        }
        if !(0.0..=1.0).contains(&self.mo_hit_transfer) {
            return Err(ConfigError::Invalid {
                field: "mo_hit_transfer",
                reason: format!("must be in [0, 1], got {}", self.mo_hit_transfer),
            });
        }
        if !(self.max_velocity > 0.0) {
            return Err(ConfigError::Invalid {
                field: "max_velocity",
                reason: format!("must be positive, got {}", self.max_velocity),
            });
        }
        Ok(())
    }
}
