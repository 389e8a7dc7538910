//! Script Hooks
//!
//! Optional per-preset callbacks. The script-side state for an object is
//! created lazily on its first scripted update and torn down on destroy;
//! a missing hook is simply skipped.

use std::fmt;
use std::sync::Arc;

use super::movable::MovableObject;

pub type ScriptFn = Arc<dyn Fn(&mut MovableObject) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ScriptHooks {
    pub on_create: Option<ScriptFn>,
    pub on_update: Option<ScriptFn>,
    pub on_destroy: Option<ScriptFn>,
}

impl ScriptHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(mut self, f: impl Fn(&mut MovableObject) + Send + Sync + 'static) -> Self {
        self.on_create = Some(Arc::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&mut MovableObject) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Arc::new(f));
        self
    }

    pub fn on_destroy(mut self, f: impl Fn(&mut MovableObject) + Send + Sync + 'static) -> Self {
        self.on_destroy = Some(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_create.is_none() && self.on_update.is_none() && self.on_destroy.is_none()
    }
}

impl fmt::Debug for ScriptHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptHooks")
            .field("on_create", &self.on_create.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

impl MovableObject {
    pub fn scripts(&self) -> Option<&ScriptHooks> {
        self.scripts.as_ref()
    }

    pub fn set_scripts(&mut self, hooks: Option<ScriptHooks>) {
        self.scripts = hooks.filter(|h| !h.is_empty());
        self.script_created = false;
    }

    pub fn script_created(&self) -> bool {
        self.script_created
    }

    pub(crate) fn run_update_script(&mut self) {
        let Some(hooks) = self.scripts.clone() else {
            return;
        };
        if !self.script_created {
            self.script_created = true;
            if let Some(create) = &hooks.on_create {
                create(self);
            }
        }
        if let Some(update) = &hooks.on_update {
            update(self);
        }
    }

    pub(crate) fn run_destroy_script(&mut self) {
        if !self.script_created {
            return;
        }
        self.script_created = false;
        if let Some(destroy) = self.scripts.as_ref().and_then(|h| h.on_destroy.clone()) {
            destroy(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::UniqueIds;
    use crate::game::scene::Scene;
    use crate::game::movable::UpdateContext;
    use crate::math::Vec2;
    use crate::preset::ObjectKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lazy_create_then_update() {
        let created = Arc::new(AtomicUsize::new(0));
        let c = created.clone();
        let hooks = ScriptHooks::new()
            .on_create(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_update(|obj| obj.vel += Vec2::new(1.0, 0.0));

        let mut obj = MovableObject::new(ObjectKind::Rotating, UniqueIds::new().next_id());
        obj.set_scripts(Some(hooks));
        assert!(!obj.script_created());

        let scene = Scene::new(16, 16, false);
        let ctx = UpdateContext { dt: 1.0 / 60.0, scene: &scene };
        obj.update(&ctx);
        obj.update(&ctx);

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(obj.script_created());
        assert_eq!(obj.vel, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_destroy_only_after_create() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let d = destroyed.clone();
        let hooks = ScriptHooks::new().on_destroy(move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        });

        let mut obj = MovableObject::new(ObjectKind::Rotating, UniqueIds::new().next_id());
        obj.set_scripts(Some(hooks));
        obj.destroy();
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);

        let scene = Scene::new(16, 16, false);
        obj.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene });
        obj.destroy();
        obj.destroy();
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_hooks_is_noop() {
        let mut obj = MovableObject::new(ObjectKind::Rotating, UniqueIds::new().next_id());
        obj.set_scripts(Some(ScriptHooks::new()));
        assert!(obj.scripts().is_none());
        let scene = Scene::new(16, 16, false);
        assert!(obj.update(&UpdateContext { dt: 1.0 / 60.0, scene: &scene }).is_empty());
    }
}
