//! Axis-aligned bounding box

use serde::{Serialize, Deserialize};

use super::Vec2;

/// Box defined by its top-left corner and size (+Y down)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_center(center: Vec2, half_w: f32, half_h: f32) -> Self {
        Self::new(center.x - half_w, center.y - half_h, half_w * 2.0, half_h * 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.right() && other.x < self.right()
            && self.y < other.bottom() && other.y < self.bottom()
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(self.x - margin, self.y - margin, self.w + margin * 2.0, self.h + margin * 2.0)
    }
}
