//! Class Metadata
//!
//! The built-in class hierarchy presets are declared against. Classes are
//! data only: behaviour hangs off the `ObjectKind` tag the instantiable
//! classes map to.

use serde::{Serialize, Deserialize};

/// Concrete object kinds. Abstract classes have no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Single-pixel particle
    Pixel,
    /// Free rotating body
    Rotating,
    Actor,
    Attachable,
    HeldDevice,
    Turret,
    Leg,
}

impl ObjectKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            ObjectKind::Pixel => "MOPixel",
            ObjectKind::Rotating => "MOSRotating",
            ObjectKind::Actor => "Actor",
            ObjectKind::Attachable => "Attachable",
            ObjectKind::HeldDevice => "HeldDevice",
            ObjectKind::Turret => "Turret",
            ObjectKind::Leg => "Leg",
        }
    }

    /// Kinds that are built to hang off a parent joint.
    pub fn is_attachable(&self) -> bool {
        matches!(
            self,
            ObjectKind::Attachable | ObjectKind::HeldDevice | ObjectKind::Turret | ObjectKind::Leg
        )
    }

    pub fn is_device(&self) -> bool {
        matches!(self, ObjectKind::HeldDevice)
    }
}

/// One entry in the class table.
#[derive(Debug, Clone, Copy)]
pub struct ClassInfo {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    /// `None` for abstract classes
    pub kind: Option<ObjectKind>,
}

impl ClassInfo {
    pub fn is_abstract(&self) -> bool {
        self.kind.is_none()
    }
}

pub const CLASSES: &[ClassInfo] = &[
    ClassInfo { name: "MovableObject", parent: None, kind: None },
    ClassInfo { name: "MOPixel", parent: Some("MovableObject"), kind: Some(ObjectKind::Pixel) },
    ClassInfo { name: "MOSRotating", parent: Some("MovableObject"), kind: Some(ObjectKind::Rotating) },
    ClassInfo { name: "Actor", parent: Some("MOSRotating"), kind: Some(ObjectKind::Actor) },
    ClassInfo { name: "Attachable", parent: Some("MOSRotating"), kind: Some(ObjectKind::Attachable) },
    ClassInfo { name: "HeldDevice", parent: Some("Attachable"), kind: Some(ObjectKind::HeldDevice) },
    ClassInfo { name: "Turret", parent: Some("Attachable"), kind: Some(ObjectKind::Turret) },
    ClassInfo { name: "Leg", parent: Some("Attachable"), kind: Some(ObjectKind::Leg) },
];

pub fn class_info(name: &str) -> Option<&'static ClassInfo> {
    CLASSES.iter().find(|c| c.name == name)
}

/// Whether `class` is `ancestor` or derives from it.
pub fn is_a(class: &str, ancestor: &str) -> bool {
    let mut current = class_info(class);
    while let Some(info) = current {
        if info.name == ancestor {
            return true;
        }
        current = info.parent.and_then(class_info);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_class() {
        for info in CLASSES.iter().filter(|c| !c.is_abstract()) {
            let kind = info.kind.unwrap();
            assert_eq!(kind.class_name(), info.name);
        }
    }

    #[test]
    fn test_is_a_walks_parents() {
        assert!(is_a("Turret", "Attachable"));
        assert!(is_a("Turret", "MovableObject"));
        assert!(is_a("Leg", "Leg"));
        assert!(!is_a("Actor", "Attachable"));
        assert!(!is_a("Nope", "MovableObject"));
    }

    #[test]
    fn test_root_class_is_abstract() {
        assert!(class_info("MovableObject").unwrap().is_abstract());
        assert!(!class_info("MOPixel").unwrap().is_abstract());
    }
}
