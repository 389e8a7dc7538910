//! Error types
//!
//! Only data and IO failures are errors. Broken invariants (abstract class
//! instantiation, double registration) panic; bad physical parameters are
//! corrected in place.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or resolving presets.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Unknown class '{0}'")]
    UnknownClass(String),
    #[error("Class '{0}' is abstract and cannot have presets")]
    AbstractClass(String),
    #[error("Preset '{name}' of class '{class}' already defined in module '{module}'")]
    Duplicate { class: String, name: String, module: String },
    #[error("No preset '{name}' of class '{class}'")]
    Missing { class: String, name: String },
    #[error("Invalid preset '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Errors raised while loading simulation settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Any error surfaced by the crate.
#[derive(Debug, Error)]
pub enum DebrisError {
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = DebrisError> = std::result::Result<T, E>;
