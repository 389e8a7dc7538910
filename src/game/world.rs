//! Simulation World
//!
//! One context object holding everything a frame touches: settings, the
//! preset registry, terrain, the object manager, the MOID index and the two
//! id-buffers. Nothing is global; every phase gets what it needs passed in.
//!
//! A frame runs each phase over every object before the next phase starts:
//!
//! additions, PreTravel, Travel, MO hit resolution, PostTravel, Update,
//! cleanup, MOID registration.
//!
//! Travel reads `hit_buffer`, a snapshot of the live id-buffer taken at the
//! start of the frame, so erasing and redrawing silhouettes during the frame
//! can't hide objects from each other.
//!
//! The live `id_buffer` is authoritative only after registration. Between
//! PostTravel and registration it holds post-travel silhouettes under last
//! frame's MOIDs; registration clears it and redraws every object under the
//! new numbering.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SimConfig;
use crate::error::PresetError;
use crate::math::Vec2;
use crate::preset::PresetRegistry;
use super::collision::TravelContext;
use super::entity::{UniqueId, UniqueIds};
use super::event::Events;
use super::id_buffer::IdBuffer;
use super::manager::MovableMan;
use super::moid::MoidIndex;
use super::movable::{MovableObject, UpdateContext};
use super::scene::Scene;

/// Counts reported after each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    /// Root objects
    pub roots: usize,
    /// Objects including attached parts
    pub objects: usize,
    /// Registered MOIDs, reserved slot excluded
    pub moids: usize,
    pub mo_hits: usize,
    pub settled: usize,
    pub deleted: usize,
}

pub struct SimWorld {
    pub config: SimConfig,
    pub presets: PresetRegistry,
    pub scene: Scene,
    pub movables: MovableMan,
    pub moids: MoidIndex,
    /// Live MOID raster, rebuilt by the registration pass
    pub id_buffer: IdBuffer,
    /// Start-of-frame copy read during Travel
    hit_buffer: IdBuffer,
    pub uids: UniqueIds,
    pub events: Events,
    rng: StdRng,
    frame: u64,
}

impl SimWorld {
    pub fn new(config: SimConfig) -> Self {
        Self::with_presets(config, PresetRegistry::new())
    }

    pub fn with_presets(config: SimConfig, mut presets: PresetRegistry) -> Self {
        let (w, h, wrap) = (config.scene_width, config.scene_height, config.wrap_x);
        presets.set_default_rest_threshold_ms(config.rest_threshold_ms);
        Self {
            presets,
            scene: Scene::new(w, h, wrap),
            movables: MovableMan::new(),
            moids: MoidIndex::new(),
            id_buffer: IdBuffer::new(w, h, wrap),
            hit_buffer: IdBuffer::new(w, h, wrap),
            uids: UniqueIds::new(),
            events: Events::new(),
            rng: StdRng::seed_from_u64(config.seed),
            frame: 0,
            config,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn hit_buffer(&self) -> &IdBuffer {
        &self.hit_buffer
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    /// Clone a preset at `pos`. It joins the simulation next frame.
    pub fn spawn(&mut self, class: &str, name: &str, module: Option<&str>, pos: Vec2) -> Result<UniqueId, PresetError> {
        let mut obj = self.presets.instantiate(class, name, module, &mut self.uids)?;
        obj.translate(pos - obj.pos);
        Ok(self.add(obj))
    }

    /// Queue a hand-built object. It joins the simulation next frame.
    pub fn add(&mut self, obj: MovableObject) -> UniqueId {
        let uid = obj.unique_id();
        self.movables.add(obj);
        uid
    }

    /// Fresh id for objects built outside the registry.
    pub fn next_id(&mut self) -> UniqueId {
        self.uids.next_id()
    }

    // =========================================================================
    // Frame
    // =========================================================================

    pub fn step(&mut self) -> FrameStats {
        self.events.clear_all();
        self.frame += 1;
        let dt = self.config.delta_time;

        self.movables.flush_additions(&mut self.events);
        self.hit_buffer.copy_from(&self.id_buffer);

        self.movables.pre_travel_all(&mut self.id_buffer, &self.config);
        self.movables.apply_ignore_targets();

        let hits = {
            let ctx = TravelContext {
                dt,
                global_acc: self.config.global_acceleration,
                scene: &self.scene,
                hit_buffer: &self.hit_buffer,
                moids: &self.moids,
                allow_settle: self.config.settle_enabled,
            };
            self.movables.travel_all(&ctx)
        };
        self.movables
            .resolve_mo_hits(hits, &self.moids, self.config.mo_hit_transfer, &mut self.events);

        self.movables.post_travel_all(&mut self.id_buffer, &self.scene, &self.config);

        let ctx = UpdateContext { dt, scene: &self.scene };
        self.movables.update_all(&ctx, &mut self.events);

        self.movables.cleanup(
            &mut self.scene,
            &self.presets,
            &mut self.uids,
            &mut self.rng,
            &self.config,
            &mut self.events,
        );
        self.movables.register_all(&mut self.moids, &mut self.id_buffer);

        FrameStats {
            frame: self.frame,
            roots: self.movables.count(),
            objects: self.movables.total_count(),
            moids: self.moids.len().saturating_sub(1),
            mo_hits: self.events.mo_hit.len(),
            settled: self.events.settled.len(),
            deleted: self.events.deleted.len(),
        }
    }

    /// Step `frames` times, returning the last frame's stats.
    pub fn run(&mut self, frames: u32) -> FrameStats {
        let mut stats = FrameStats::default();
        for _ in 0..frames {
            stats = self.step();
        }
        stats
    }

    /// Drop every object and reset the rasters. Terrain is kept.
    pub fn clear(&mut self) {
        self.movables.clear();
        self.moids.clear();
        self.id_buffer.clear();
        self.hit_buffer.clear();
        self.events.clear_all();
    }
}
