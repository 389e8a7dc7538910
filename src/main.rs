//! debris viewer
//!
//! Steps a demo world and draws the terrain with the MOID raster on top.
//!
//! Controls:
//! - Space: pause, N: single step while paused
//! - Left click: drop a crate, right click: the crab fires at the cursor
//! - Tab: cycle the id-buffer overlay, R: rebuild the demo

use macroquad::prelude::*;

use debris::game::scene::{materials, AIR};
use debris::game::{SceneQuery, SimWorld, UniqueId};
use debris::math::Vec2 as SimVec2;
use debris::{PresetRegistry, SimConfig};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings file read from the working directory
const CONFIG_FILE: &str = "debris.ron";
const DATA_DIR: &str = "data";

/// Simulation steps allowed per rendered frame before dropping time
const MAX_STEPS_PER_FRAME: u32 = 4;

const BULLET_SPEED: f32 = 400.0;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("debris v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// What the id-buffer overlay colours by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    Roots,
    Moids,
    Off,
}

impl Overlay {
    fn next(self) -> Self {
        match self {
            Overlay::Roots => Overlay::Moids,
            Overlay::Moids => Overlay::Off,
            Overlay::Off => Overlay::Roots,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Overlay::Roots => "roots",
            Overlay::Moids => "moids",
            Overlay::Off => "off",
        }
    }
}

/// Scene-to-screen mapping, integer scaled and centred.
struct View {
    x: f32,
    y: f32,
    scale: f32,
}

impl View {
    fn fit(width: u32, height: u32) -> Self {
        let scale = (screen_width() / width as f32)
            .min(screen_height() / height as f32)
            .floor()
            .max(1.0);
        Self {
            x: ((screen_width() - width as f32 * scale) * 0.5).floor(),
            y: ((screen_height() - height as f32 * scale) * 0.5).floor(),
            scale,
        }
    }

    fn to_scene(&self, (mx, my): (f32, f32)) -> SimVec2 {
        SimVec2::new((mx - self.x) / self.scale, (my - self.y) / self.scale)
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    debris::logging::init(false);

    let config = load_config();
    let presets = load_presets().await;
    let (mut world, mut crab) = build_demo(config.clone(), presets);

    let mut paused = false;
    let mut overlay = Overlay::Roots;
    let mut accumulator = 0.0f32;

    loop {
        if is_key_pressed(KeyCode::Space) {
            paused = !paused;
        }
        if is_key_pressed(KeyCode::Tab) {
            overlay = overlay.next();
        }
        if is_key_pressed(KeyCode::R) {
            let presets = std::mem::take(&mut world.presets);
            (world, crab) = build_demo(config.clone(), presets);
        }

        let (w, h) = (world.scene.width(), world.scene.height());
        let view = View::fit(w, h);
        let mouse = view.to_scene(mouse_position());

        if is_mouse_button_pressed(MouseButton::Left) {
            if let Err(e) = world.spawn("MOSRotating", "Crate", None, mouse) {
                log::warn!("Can't drop crate: {}", e);
            }
        }
        if let Some(crab) = crab {
            aim(&mut world, crab, mouse);
            if is_mouse_button_pressed(MouseButton::Right) {
                fire(&mut world, crab, mouse);
            }
        }

        if !paused {
            let dt = world.config.delta_time;
            accumulator += get_frame_time();
            let mut steps = 0;
            while accumulator >= dt && steps < MAX_STEPS_PER_FRAME {
                if let Some(crab) = crab {
                    plant_legs(&mut world, crab);
                }
                world.step();
                accumulator -= dt;
                steps += 1;
            }
            if steps == MAX_STEPS_PER_FRAME {
                accumulator = 0.0;
            }
        } else if is_key_pressed(KeyCode::N) {
            world.step();
        }

        clear_background(Color::from_rgba(30, 30, 35, 255));

        let pixels = rasterize(&world, overlay);
        let texture = Texture2D::from_rgba8(w as u16, h as u16, &pixels);
        texture.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &texture,
            view.x,
            view.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w as f32 * view.scale, h as f32 * view.scale)),
                ..Default::default()
            },
        );

        let status = format!(
            "frame {}  roots {}  objects {}  moids {}  overlay {}{}  {} fps",
            world.frame(),
            world.movables.count(),
            world.movables.total_count(),
            world.moids.len().saturating_sub(1),
            overlay.label(),
            if paused { "  [paused]" } else { "" },
            get_fps(),
        );
        draw_text(&status, 10.0, 20.0, 20.0, Color::from_rgba(220, 220, 220, 255));

        next_frame().await;
    }
}

/// Settings from `debris.ron` when present, defaults otherwise.
fn load_config() -> SimConfig {
    #[cfg(not(target_arch = "wasm32"))]
    if std::path::Path::new(CONFIG_FILE).exists() {
        match SimConfig::load(CONFIG_FILE) {
            Ok(config) => return config,
            Err(e) => log::warn!("Ignoring {}: {}", CONFIG_FILE, e),
        }
    }
    SimConfig::default()
}

/// Presets from the data directory, or the built-in set if none load.
async fn load_presets() -> PresetRegistry {
    let mut presets = PresetRegistry::new();

    #[cfg(not(target_arch = "wasm32"))]
    if let Err(e) = presets.load_dir(DATA_DIR) {
        log::warn!("No preset directory: {}", e);
    }

    #[cfg(target_arch = "wasm32")]
    if let Ok(manifest) = load_string(&format!("{}/manifest.txt", DATA_DIR)).await {
        for file in manifest.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match load_string(&format!("{}/{}", DATA_DIR, file)).await {
                Ok(source) => {
                    if let Err(e) = presets.load_str(&source) {
                        log::warn!("Failed to load presets {}: {}", file, e);
                    }
                }
                Err(e) => log::warn!("Failed to fetch {}: {}", file, e),
            }
        }
    }

    if presets.is_empty() {
        if let Err(e) = presets.load_str(include_str!("../data/base.ron")) {
            log::error!("Built-in presets are broken: {}", e);
        }
    }
    presets
}

/// Ground, a rock ledge, a crab and a pile of crates.
fn build_demo(config: SimConfig, presets: PresetRegistry) -> (SimWorld, Option<UniqueId>) {
    let mut world = SimWorld::with_presets(config, presets);
    let (w, h) = (world.scene.width() as i32, world.scene.height() as i32);

    world.scene.fill_rect(0, h - 24, w, h, materials::SOIL);
    world.scene.fill_rect(w / 8, h - 60, w / 3, h - 52, materials::ROCK);
    world.scene.fill_rect(w * 2 / 3, h - 40, w * 2 / 3 + 30, h - 36, materials::METAL);

    let ground = (h - 24) as f32;
    let crab = match world.spawn("Actor", "Crab", None, SimVec2::new(w as f32 * 0.5, ground - 14.0)) {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("No crab: {}", e);
            None
        }
    };

    for i in 0..6 {
        let pos = SimVec2::new(w as f32 * 0.2 + i as f32 * 9.0, 20.0 + (i % 2) as f32 * 8.0);
        if let Err(e) = world.spawn("MOSRotating", "Crate", None, pos) {
            log::warn!("No crate: {}", e);
            break;
        }
    }
    let boulder = SimVec2::new(w as f32 * 0.75, 10.0);
    if let Err(e) = world.spawn("MOSRotating", "Boulder", None, boulder) {
        log::warn!("No boulder: {}", e);
    }

    (world, crab)
}

/// Face the crab toward the cursor.
fn aim(world: &mut SimWorld, crab: UniqueId, target: SimVec2) {
    if let Some(crab) = world.movables.find_mut(crab) {
        crab.h_flipped = target.x < crab.pos.x;
    }
}

/// Point each leg at the ground under its hip.
fn plant_legs(world: &mut SimWorld, crab: UniqueId) {
    let scene = &world.scene;
    let Some(crab) = world.movables.find_mut(crab) else {
        return;
    };
    for part in crab.children_mut() {
        if part.leg().is_some() {
            let hip = part.hip_pos();
            let drop = scene.altitude(hip, 12.0, 1);
            part.reach_toward(hip + SimVec2::new(0.0, drop), scene);
        }
    }
}

/// Shoot a bullet from above the crab toward `target`, with recoil.
fn fire(world: &mut SimWorld, crab: UniqueId, target: SimVec2) {
    let Some(origin) = world.movables.find(crab).map(|c| c.pos + SimVec2::new(0.0, -8.0)) else {
        return;
    };
    let dir = (target - origin).normalize();

    let mut bullet = match world.presets.instantiate("MOPixel", "Bullet", None, &mut world.uids) {
        Ok(bullet) => bullet,
        Err(e) => {
            log::warn!("Can't fire: {}", e);
            return;
        }
    };
    bullet.pos = origin;
    bullet.vel = dir * BULLET_SPEED;
    bullet.set_ignore_uid(Some(crab));
    let recoil = -(dir * BULLET_SPEED * bullet.mass());
    world.add(bullet);

    if let Some(crab) = world.movables.find_mut(crab) {
        crab.add_impulse(recoil, SimVec2::ZERO);
    }
}

fn material_color(id: u8) -> [u8; 4] {
    match id {
        AIR => [20, 22, 30, 255],
        materials::SOIL => [110, 80, 50, 255],
        materials::ROCK => [120, 120, 125, 255],
        materials::METAL => [160, 170, 185, 255],
        materials::FLESH => [200, 120, 120, 255],
        _ => [255, 0, 255, 255],
    }
}

/// Stable bright colour for an id.
fn id_color(id: u64) -> [u8; 4] {
    let h = id.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    [
        96 + (h >> 56) as u8 % 160,
        96 + (h >> 40) as u8 % 160,
        96 + (h >> 24) as u8 % 160,
        255,
    ]
}

/// Terrain with the id-buffer painted over it, as RGBA bytes.
fn rasterize(world: &SimWorld, overlay: Overlay) -> Vec<u8> {
    let (w, h) = (world.scene.width() as i32, world.scene.height() as i32);
    let mut pixels = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let moid = world.id_buffer.get(x, y);
            let color = match overlay {
                _ if moid.is_none() => material_color(world.scene.material_at(x, y)),
                Overlay::Roots => id_color(world.moids.root_of(moid).map_or(0, |uid| uid.get())),
                Overlay::Moids => id_color(moid.get() as u64),
                Overlay::Off => material_color(world.scene.material_at(x, y)),
            };
            pixels.extend_from_slice(&color);
        }
    }
    pixels
}
