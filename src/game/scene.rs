//! Scene and terrain
//!
//! `SceneQuery` is the narrow view of the world the simulation core needs:
//! bounds, horizontal wrapping, and what material sits at a pixel. `Scene`
//! is the bitmap-backed implementation used by the world and the tests.

use serde::{Serialize, Deserialize};

use crate::math::{Aabb, Vec2};

/// Index into the scene's material table. 0 is always air.
pub type MaterialId = u8;

pub const AIR: MaterialId = 0;

/// Terrain material properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Higher priority wins when settling objects overlap existing terrain
    pub priority: i32,
    /// Bounce factor applied on terrain hits (0 = dead stop, 1 = elastic)
    pub restitution: f32,
    /// Fraction of tangential speed lost per terrain hit
    pub friction: f32,
}

impl Material {
    pub fn new(name: &str, priority: i32, restitution: f32, friction: f32) -> Self {
        Self {
            name: name.to_string(),
            priority,
            restitution,
            friction,
        }
    }
}

/// Scene queries the simulation core depends on.
pub trait SceneQuery {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn wraps_x(&self) -> bool;

    /// Material at a pixel. Out-of-bounds pixels are air.
    fn material_at(&self, x: i32, y: i32) -> MaterialId;

    fn material(&self, id: MaterialId) -> Option<&Material>;

    fn is_solid(&self, x: i32, y: i32) -> bool {
        self.material_at(x, y) != AIR
    }

    fn bounds(&self) -> Aabb {
        Aabb::new(0.0, 0.0, self.width() as f32, self.height() as f32)
    }

    /// Wrap a point horizontally if the scene wraps. Returns true if it moved.
    fn wrap_point(&self, p: &mut Vec2) -> bool {
        if !self.wraps_x() {
            return false;
        }
        let w = self.width() as f32;
        if p.x < 0.0 || p.x >= w {
            p.x = p.x.rem_euclid(w);
            return true;
        }
        false
    }

    /// Whether a point is inside the scene grown by `margin`. Wrapping
    /// scenes have no horizontal edge.
    fn is_within_bounds(&self, p: Vec2, margin: f32) -> bool {
        let b = self.bounds().expand(margin);
        let x_ok = self.wraps_x() || (p.x >= b.x && p.x < b.right());
        x_ok && p.y >= b.y && p.y < b.bottom()
    }

    /// Vector from `from` to `to`, taking the short way round a wrapping scene.
    fn shortest_distance(&self, from: Vec2, to: Vec2) -> Vec2 {
        let mut d = to - from;
        if self.wraps_x() {
            let w = self.width() as f32;
            if d.x > w * 0.5 {
                d.x -= w;
            } else if d.x < -w * 0.5 {
                d.x += w;
            }
        }
        d
    }

    /// Distance straight down to the first solid pixel, capped at `max`.
    /// `accuracy` is the step in pixels.
    fn altitude(&self, p: Vec2, max: f32, accuracy: u32) -> f32 {
        let step = accuracy.max(1) as f32;
        let (x, _) = p.to_pixel();
        let mut d = 0.0;
        while d < max {
            if self.is_solid(x, (p.y + d).round() as i32) {
                return d;
            }
            d += step;
        }
        max
    }
}

/// Bitmap terrain.
pub struct Scene {
    width: u32,
    height: u32,
    wrap_x: bool,
    terrain: Vec<MaterialId>,
    materials: Vec<Material>,
}

/// Built-in material ids for `Scene::new`.
pub mod materials {
    use super::MaterialId;

    pub const SOIL: MaterialId = 1;
    pub const ROCK: MaterialId = 2;
    pub const METAL: MaterialId = 3;
    pub const FLESH: MaterialId = 4;
}

impl Scene {
    /// Empty (all air) scene with the built-in material table.
    pub fn new(width: u32, height: u32, wrap_x: bool) -> Self {
        Self {
            width,
            height,
            wrap_x,
            terrain: vec![AIR; (width as usize) * (height as usize)],
            materials: vec![
                Material::new("Air", 0, 0.0, 0.0),
                Material::new("Soil", 10, 0.3, 0.4),
                Material::new("Rock", 50, 0.5, 0.2),
                Material::new("Metal", 100, 0.6, 0.1),
                Material::new("Flesh", 5, 0.2, 0.6),
            ],
        }
    }

    /// Register a material and return its id, or `None` if the table is full.
    pub fn add_material(&mut self, material: Material) -> Option<MaterialId> {
        if self.materials.len() > MaterialId::MAX as usize {
            return None;
        }
        self.materials.push(material);
        Some((self.materials.len() - 1) as MaterialId)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = if self.wrap_x { x.rem_euclid(self.width as i32) } else { x };
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn set_material(&mut self, x: i32, y: i32, id: MaterialId) {
        if let Some(i) = self.index(x, y) {
            self.terrain[i] = id;
        }
    }

    /// Fill a rectangle of pixels (inclusive-exclusive) with a material.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, id: MaterialId) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_material(x, y, id);
            }
        }
    }

    /// Bake pixels into terrain. An existing solid pixel is only replaced by
    /// a material of equal or higher priority. Returns how many were written.
    pub fn settle_pixels(&mut self, coords: &[(i32, i32)], id: MaterialId) -> usize {
        let priority = self.materials.get(id as usize).map(|m| m.priority).unwrap_or(0);
        let mut written = 0;
        for &(x, y) in coords {
            let Some(i) = self.index(x, y) else {
                continue;
            };
            let existing = self.terrain[i];
            let existing_priority = self.materials.get(existing as usize).map(|m| m.priority).unwrap_or(0);
            if existing == AIR || existing_priority <= priority {
                self.terrain[i] = id;
                written += 1;
            }
        }
        written
    }

    pub fn clear(&mut self) {
        self.terrain.fill(AIR);
    }

    /// Raw terrain, row-major.
    pub fn terrain(&self) -> &[MaterialId] {
        &self.terrain
    }
}

impl SceneQuery for Scene {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn wraps_x(&self) -> bool {
        self.wrap_x
    }

    fn material_at(&self, x: i32, y: i32) -> MaterialId {
        self.index(x, y).map(|i| self.terrain[i]).unwrap_or(AIR)
    }

    fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_air() {
        let scene = Scene::new(10, 10, false);
        assert_eq!(scene.material_at(-1, 5), AIR);
        assert_eq!(scene.material_at(5, 10), AIR);
    }

    #[test]
    fn test_wrapping_lookup_and_point() {
        let mut scene = Scene::new(10, 10, true);
        scene.set_material(0, 3, materials::ROCK);
        assert!(scene.is_solid(10, 3));
        assert!(scene.is_solid(-10, 3));

        let mut p = Vec2::new(12.5, 1.0);
        assert!(scene.wrap_point(&mut p));
        assert!((p.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_bounds_with_margin() {
        let scene = Scene::new(100, 50, false);
        assert!(scene.is_within_bounds(Vec2::new(-5.0, 10.0), 10.0));
        assert!(!scene.is_within_bounds(Vec2::new(-15.0, 10.0), 10.0));
        assert!(!scene.is_within_bounds(Vec2::new(10.0, 70.0), 10.0));

        let wrapping = Scene::new(100, 50, true);
        assert!(wrapping.is_within_bounds(Vec2::new(-500.0, 10.0), 10.0));
    }

    #[test]
    fn test_shortest_distance_wraps() {
        let scene = Scene::new(100, 50, true);
        let d = scene.shortest_distance(Vec2::new(95.0, 0.0), Vec2::new(5.0, 0.0));
        assert!((d.x - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_altitude() {
        let mut scene = Scene::new(20, 20, false);
        scene.fill_rect(0, 15, 20, 20, materials::SOIL);
        assert!((scene.altitude(Vec2::new(5.0, 5.0), 100.0, 1) - 10.0).abs() < 1e-5);
        assert_eq!(scene.altitude(Vec2::new(5.0, 5.0), 4.0, 1), 4.0);
    }

    #[test]
    fn test_settle_respects_priority() {
        let mut scene = Scene::new(10, 10, false);
        scene.set_material(1, 1, materials::METAL);
        let written = scene.settle_pixels(&[(1, 1), (2, 1)], materials::SOIL);
        assert_eq!(written, 1);
        assert_eq!(scene.material_at(1, 1), materials::METAL);
        assert_eq!(scene.material_at(2, 1), materials::SOIL);
    }
}
