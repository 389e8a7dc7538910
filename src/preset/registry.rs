//! Preset Registry
//!
//! Catalog of data-defined templates keyed by (class, name, module).
//! `instantiate` is the cloning service: it builds a fresh object from a
//! preset and recursively builds the sub-parts it names.
//!
//! Modules are kept in load order. A lookup without a module searches the
//! most recently loaded module first, so later modules override earlier
//! ones by name.

use std::collections::HashMap;
use std::path::Path;

use ron::extensions::Extensions;

use crate::error::PresetError;
use crate::game::entity::UniqueIds;
use crate::game::movable::{MovableObject, DEFAULT_REST_THRESHOLD_MS};
use crate::game::script::ScriptHooks;
use super::class::{class_info, ObjectKind};
use super::def::{PresetDef, PresetFile, PresetRef};

/// Sub-part nesting deeper than this is cut off.
const MAX_PART_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PresetKey {
    class: String,
    name: String,
    module: String,
}

#[derive(Debug)]
pub struct PresetRegistry {
    /// Module names in load order
    modules: Vec<String>,
    presets: HashMap<PresetKey, PresetDef>,
    /// Script hooks by (class, name), shared across modules
    hooks: HashMap<(String, String), ScriptHooks>,
    default_rest_threshold_ms: f32,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            presets: HashMap::new(),
            hooks: HashMap::new(),
            default_rest_threshold_ms: DEFAULT_REST_THRESHOLD_MS,
        }
    }

    /// Rest threshold for presets that don't set their own.
    pub fn set_default_rest_threshold_ms(&mut self, ms: f32) {
        self.default_rest_threshold_ms = ms;
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Register one preset under `module`.
    pub fn add_preset(&mut self, module: &str, def: PresetDef) -> Result<(), PresetError> {
        let kind = Self::check(&def)?;

        let key = PresetKey {
            class: def.class.clone(),
            name: def.name.clone(),
            module: module.to_string(),
        };
        if self.presets.contains_key(&key) {
            return Err(PresetError::Duplicate {
                class: key.class,
                name: key.name,
                module: key.module,
            });
        }

        if !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
        }
        log::trace!("preset {}/{} ({:?}) in '{}'", key.class, key.name, kind, module);
        self.presets.insert(key, def);
        Ok(())
    }

    /// Parse a RON preset file and register its presets. Returns the count.
    /// Optional blocks may be written bare, without `Some(..)`.
    pub fn load_str(&mut self, source: &str) -> Result<usize, PresetError> {
        let file: PresetFile = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(source)?;
        let count = file.presets.len();
        for def in file.presets {
            self.add_preset(&file.module, def)?;
        }
        Ok(count)
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, PresetError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| PresetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.load_str(&source)?;
        log::info!("Loaded {} presets from {:?}", count, path);
        Ok(count)
    }

    /// Load every `.ron` file in a directory, in filename order. Files that
    /// fail to load are logged and skipped.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, PresetError> {
        let dir = dir.as_ref();
        let read = std::fs::read_dir(dir).map_err(|source| PresetError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries: Vec<_> = read
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.to_ascii_lowercase() == "ron")
                    .unwrap_or(false)
            })
            .collect();
        entries.sort();

        let mut total = 0;
        for path in entries {
            match self.load_file(&path) {
                Ok(count) => total += count,
                Err(e) => log::warn!("Failed to load presets {:?}: {}", path, e),
            }
        }
        Ok(total)
    }

    /// Reject presets that can never be instantiated.
    fn check(def: &PresetDef) -> Result<ObjectKind, PresetError> {
        let info = class_info(&def.class).ok_or_else(|| PresetError::UnknownClass(def.class.clone()))?;
        let Some(kind) = info.kind else {
            return Err(PresetError::AbstractClass(def.class.clone()));
        };

        let invalid = |reason: &str| PresetError::Invalid {
            name: def.name.clone(),
            reason: reason.to_string(),
        };
        if def.name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        if !def.body.mass.is_finite() {
            return Err(invalid("mass is not a number"));
        }
        if def.turret.is_some() && kind != ObjectKind::Turret {
            return Err(invalid("turret block on a non-turret class"));
        }
        if def.leg.is_some() && kind != ObjectKind::Leg {
            return Err(invalid("leg block on a non-leg class"));
        }
        if let Some(leg) = &def.leg {
            if leg.min_extension > leg.max_extension {
                return Err(invalid("leg min_extension exceeds max_extension"));
            }
        }
        Ok(kind)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find a preset. Without a module, the newest module that defines it wins.
    pub fn get_entity_preset(&self, class: &str, name: &str, module: Option<&str>) -> Option<&PresetDef> {
        let lookup = |module: &str| {
            self.presets.get(&PresetKey {
                class: class.to_string(),
                name: name.to_string(),
                module: module.to_string(),
            })
        };
        match module {
            Some(module) => lookup(module),
            None => self.modules.iter().rev().find_map(|m| lookup(m)),
        }
    }

    pub fn get_ref(&self, preset: &PresetRef) -> Option<&PresetDef> {
        self.get_entity_preset(&preset.class, &preset.name, preset.module.as_deref())
    }

    /// Every (owner, reference) pair where the referenced preset is missing.
    pub fn missing_references(&self) -> Vec<(String, PresetRef)> {
        let mut missing: Vec<_> = self
            .presets
            .iter()
            .flat_map(|(key, def)| {
                def.references()
                    .filter(move |r| self.get_ref(r).is_none())
                    .map(move |r| (format!("{}/{}/{}", key.module, key.class, key.name), r.clone()))
            })
            .collect();
        missing.sort_by(|a, b| a.0.cmp(&b.0));
        missing
    }

    pub fn set_hooks(&mut self, class: &str, name: &str, hooks: ScriptHooks) {
        self.hooks.insert((class.to_string(), name.to_string()), hooks);
    }

    // =========================================================================
    // Instantiation
    // =========================================================================

    /// Clone a new object from a preset, sub-parts included.
    pub fn instantiate(&self, class: &str, name: &str, module: Option<&str>, ids: &mut UniqueIds) -> Result<MovableObject, PresetError> {
        let def = self.get_entity_preset(class, name, module).ok_or_else(|| PresetError::Missing {
            class: class.to_string(),
            name: name.to_string(),
        })?;
        Ok(self.build(def, ids, 0))
    }

    pub fn instantiate_ref(&self, preset: &PresetRef, ids: &mut UniqueIds) -> Result<MovableObject, PresetError> {
        self.instantiate(&preset.class, &preset.name, preset.module.as_deref(), ids)
    }

    /// A default object of a built-in class, no preset involved.
    ///
    /// Panics for abstract classes.
    pub fn create_default(class: &str, ids: &mut UniqueIds) -> Result<MovableObject, PresetError> {
        let info = class_info(class).ok_or_else(|| PresetError::UnknownClass(class.to_string()))?;
        let kind = match info.kind {
            Some(kind) => kind,
            None => panic!("cannot instantiate abstract class '{}'", class),
        };
        Ok(MovableObject::new(kind, ids.next_id()))
    }

    fn build(&self, def: &PresetDef, ids: &mut UniqueIds, depth: usize) -> MovableObject {
        let kind = match class_info(&def.class).and_then(|c| c.kind) {
            Some(kind) => kind,
            None => panic!("preset '{}' registered with non-instantiable class '{}'", def.name, def.class),
        };

        let mut obj = MovableObject::from_def(def, kind, ids.next_id(), self.default_rest_threshold_ms);
        obj.set_scripts(self.hooks.get(&(def.class.clone(), def.name.clone())).cloned());

        if depth >= MAX_PART_DEPTH {
            log::warn!("{}: sub-parts nested too deep, left empty", def.name);
            return obj;
        }

        for attachment in &def.attachables {
            if let Some(child) = self.sub_part(&def.name, &attachment.preset, ids, depth) {
                let mut joint = child.joint().cloned().unwrap_or_default();
                if let Some(offset) = attachment.offset {
                    joint.parent_offset = offset;
                }
                obj.add_attachable(child, joint);
            }
        }

        if let Some(mounted) = def.turret.as_ref().and_then(|t| t.mounted.as_ref()) {
            if let Some(device) = self.sub_part(&def.name, mounted, ids, depth) {
                if obj.set_mounted(device).is_err() {
                    log::warn!("{}: could not mount '{}'", def.name, mounted.name);
                }
            }
        }

        if let Some(foot) = def.leg.as_ref().and_then(|l| l.foot.as_ref()) {
            if let Some(part) = self.sub_part(&def.name, foot, ids, depth) {
                if obj.set_foot(part).is_err() {
                    log::warn!("{}: could not fit foot '{}'", def.name, foot.name);
                }
            }
        }

        obj
    }

    fn sub_part(&self, owner: &str, preset: &PresetRef, ids: &mut UniqueIds, depth: usize) -> Option<MovableObject> {
        match self.get_ref(preset) {
            Some(def) => Some(self.build(def, ids, depth + 1)),
            None => {
                log::warn!("{}: sub-part {}/{} not found, slot left empty", owner, preset.class, preset.name);
                None
            }
        }
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
