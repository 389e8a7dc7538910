//! 2D vector

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use serde::{Serialize, Deserialize};

use super::Matrix;

/// 2D vector in scene units (pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn sqr_magnitude(self) -> f32 {
        self.dot(self)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.magnitude();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.x / l, self.y / l)
    }

    /// Same direction, new length. A zero vector points along +X.
    pub fn with_magnitude(self, magnitude: f32) -> Vec2 {
        let dir = if self.is_zero() { Vec2::new(1.0, 0.0) } else { self.normalize() };
        dir * magnitude
    }

    /// Clamp the length into [min, max], keeping direction.
    pub fn clamp_magnitude(self, min: f32, max: f32) -> Vec2 {
        let l = self.magnitude();
        if l < min {
            self.with_magnitude(min)
        } else if l > max {
            self.with_magnitude(max)
        } else {
            self
        }
    }

    /// Angle in radians measured from +X.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn rotate(self, radians: f32) -> Vec2 {
        let (sin, cos) = radians.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Mirror across the Y axis when `flip` is set.
    pub fn x_flipped(self, flip: bool) -> Vec2 {
        if flip { Vec2::new(-self.x, self.y) } else { self }
    }

    /// Rotate by a matrix, mirroring first when the owner is horizontally flipped.
    pub fn rotated_by(self, rotation: &Matrix, flip: bool) -> Vec2 {
        if flip {
            self.x_flipped(true).rotate(-rotation.angle())
        } else {
            rotation.rotate(self)
        }
    }

    pub fn lerp(self, target: Vec2, t: f32) -> Vec2 {
        self + (target - self) * t
    }

    /// Round to the integer pixel this point falls on.
    pub fn to_pixel(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Vec2) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, other: Vec2) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, s: f32) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vec2::new(x, y)
    }
}
