//! Object silhouettes
//!
//! A shape is the pixel footprint an object draws into the id-buffer and
//! bakes into terrain when it settles. Offsets are local to the object's
//! position and get rotated/flipped/scaled at draw time.

use serde::{Serialize, Deserialize};

use crate::math::{Matrix, Vec2};

/// Pixel footprint of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Single pixel
    Point,
    Circle { radius: f32 },
    Rect { half_w: f32, half_h: f32 },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Point
    }
}

impl Shape {
    /// Local pixel offsets covered by this shape at the given scale.
    pub fn local_pixels(&self, scale: f32) -> Vec<Vec2> {
        match *self {
            Shape::Point => vec![Vec2::ZERO],
            Shape::Circle { radius } => {
                let r = (radius * scale).max(0.0);
                let ri = r.ceil() as i32;
                // (r + 0.5)^2 gives rounder edges on small circles
                let r2 = (r + 0.5) * (r + 0.5);
                let mut pixels = Vec::new();
                for dy in -ri..=ri {
                    for dx in -ri..=ri {
                        if (dx * dx + dy * dy) as f32 <= r2 {
                            pixels.push(Vec2::new(dx as f32, dy as f32));
                        }
                    }
                }
                pixels
            }
            Shape::Rect { half_w, half_h } => {
                let hw = (half_w * scale).round().max(0.0) as i32;
                let hh = (half_h * scale).round().max(0.0) as i32;
                let mut pixels = Vec::with_capacity(((hw * 2 + 1) * (hh * 2 + 1)) as usize);
                for dy in -hh..=hh {
                    for dx in -hw..=hw {
                        pixels.push(Vec2::new(dx as f32, dy as f32));
                    }
                }
                pixels
            }
        }
    }

    /// Atoms to use when a preset doesn't list its own: the centre for a
    /// point, otherwise eight points around the outline.
    pub fn default_atoms(&self, scale: f32) -> Vec<Vec2> {
        match *self {
            Shape::Point => vec![Vec2::ZERO],
            Shape::Circle { radius } => {
                let r = radius * scale;
                (0..8)
                    .map(|i| Vec2::new(r, 0.0).rotate(i as f32 * std::f32::consts::FRAC_PI_4))
                    .collect()
            }
            Shape::Rect { half_w, half_h } => {
                let (w, h) = (half_w * scale, half_h * scale);
                vec![
                    Vec2::new(-w, -h), Vec2::new(0.0, -h), Vec2::new(w, -h),
                    Vec2::new(-w, 0.0), Vec2::new(w, 0.0),
                    Vec2::new(-w, h), Vec2::new(0.0, h), Vec2::new(w, h),
                ]
            }
        }
    }

    /// Radius of a circle enclosing the shape.
    pub fn bounding_radius(&self, scale: f32) -> f32 {
        match *self {
            Shape::Point => 0.5,
            Shape::Circle { radius } => radius * scale,
            Shape::Rect { half_w, half_h } => (half_w * half_w + half_h * half_h).sqrt() * scale,
        }
    }
}

/// Place local offsets in the scene at an object's pose.
pub fn world_pixels(local: &[Vec2], pos: Vec2, rotation: &Matrix, flipped: bool) -> Vec<(i32, i32)> {
    local
        .iter()
        .map(|&offset| (pos + offset.rotated_by(rotation, flipped)).to_pixel())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_is_one_pixel() {
        assert_eq!(Shape::Point.local_pixels(1.0), vec![Vec2::ZERO]);
    }

    #[test]
    fn test_rect_pixel_count() {
        let shape = Shape::Rect { half_w: 2.0, half_h: 1.0 };
        assert_eq!(shape.local_pixels(1.0).len(), 5 * 3);
        // Scale doubles each half-extent
        assert_eq!(shape.local_pixels(2.0).len(), 9 * 5);
    }

    #[test]
    fn test_circle_contains_centre_and_is_symmetric() {
        let pixels = Shape::Circle { radius: 3.0 }.local_pixels(1.0);
        assert!(pixels.contains(&Vec2::ZERO));
        for p in &pixels {
            assert!(pixels.contains(&Vec2::new(-p.x, p.y)));
        }
    }

    #[test]
    fn test_world_pixels_translate() {
        let coords = world_pixels(&[Vec2::new(1.0, 0.0)], Vec2::new(10.0, 10.0), &Matrix::IDENTITY, true);
        assert_eq!(coords, vec![(9, 10)]);
    }
}
