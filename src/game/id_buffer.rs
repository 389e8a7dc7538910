//! MOID Raster
//!
//! A scene-sized buffer holding, per pixel, the MOID of whichever object
//! last drew there. Objects remember the pixels they wrote so they can
//! erase exactly their own silhouette before moving.

use super::moid::Moid;
use super::movable::MovableObject;
use super::shape::world_pixels;

pub struct IdBuffer {
    width: u32,
    height: u32,
    wrap_x: bool,
    data: Vec<Moid>,
}

impl IdBuffer {
    pub fn new(width: u32, height: u32, wrap_x: bool) -> Self {
        Self {
            width,
            height,
            wrap_x,
            data: vec![Moid::NONE; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = if self.wrap_x { x.rem_euclid(self.width as i32) } else { x };
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Owner of a pixel. Out of range reads as no object.
    pub fn get(&self, x: i32, y: i32) -> Moid {
        self.index(x, y).map(|i| self.data[i]).unwrap_or(Moid::NONE)
    }

    pub fn set(&mut self, x: i32, y: i32, moid: Moid) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = moid;
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(Moid::NONE);
    }

    /// Overwrite with another buffer of the same size.
    pub fn copy_from(&mut self, other: &IdBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.wrap_x = other.wrap_x;
        self.data.clone_from(&other.data);
    }

    /// Pixels currently owned by `moid`.
    pub fn count(&self, moid: Moid) -> usize {
        self.data.iter().filter(|&&m| m == moid).count()
    }

    /// Row-major raw view, for drawing.
    pub fn raw(&self) -> &[Moid] {
        &self.data
    }

    /// Draw one object's silhouette under its own MOID.
    pub fn draw_object(&mut self, obj: &mut MovableObject) {
        obj.drawn_pixels.clear();
        if obj.moid.is_none() {
            return;
        }
        let pixels = world_pixels(&obj.silhouette, obj.pos, &obj.rotation, obj.h_flipped);
        for (x, y) in pixels {
            if self.index(x, y).is_some() {
                self.set(x, y, obj.moid);
                obj.drawn_pixels.push((x, y));
            }
        }
    }

    /// Erase what an object drew last time. Pixels since claimed by
    /// another object are left alone.
    pub fn erase_object(&mut self, obj: &mut MovableObject) {
        for &(x, y) in &obj.drawn_pixels {
            if let Some(i) = self.index(x, y) {
                if self.data[i] == obj.moid {
                    self.data[i] = Moid::NONE;
                }
            }
        }
        obj.drawn_pixels.clear();
    }

    /// Draw an object and its attached subtree, honouring each child's
    /// draw-before/after-parent order.
    pub fn draw_tree(&mut self, obj: &mut MovableObject) {
        for child in obj.children_mut().filter(|c| !c.draws_after_parent()) {
            self.draw_tree(child);
        }
        self.draw_object(obj);
        for child in obj.children_mut().filter(|c| c.draws_after_parent()) {
            self.draw_tree(child);
        }
    }

    pub fn erase_tree(&mut self, obj: &mut MovableObject) {
        self.erase_object(obj);
        for child in obj.children_mut() {
            self.erase_tree(child);
        }
    }
}
