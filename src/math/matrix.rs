//! 2D rotation matrix

use serde::{Serialize, Deserialize};

use super::Vec2;

/// Rotation stored as an angle plus its cached sine/cosine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Matrix {
    angle: f32,
    sin: f32,
    cos: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix { angle: 0.0, sin: 0.0, cos: 1.0 };

    pub fn new(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { angle: radians, sin, cos }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, radians: f32) {
        *self = Matrix::new(radians);
    }

    /// Rotate a vector by this matrix.
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos - v.y * self.sin, v.x * self.sin + v.y * self.cos)
    }

    pub fn inverse(&self) -> Matrix {
        Matrix::new(-self.angle)
    }

    /// Angle in degrees, for display.
    pub fn degrees(&self) -> f32 {
        self.angle.to_degrees()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<f32> for Matrix {
    fn from(radians: f32) -> Self {
        Matrix::new(radians)
    }
}

impl From<Matrix> for f32 {
    fn from(m: Matrix) -> f32 {
        m.angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let m = Matrix::new(std::f32::consts::FRAC_PI_2);
        let v = m.rotate(Vec2::new(1.0, 0.0));
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_inverse_undoes_rotation() {
        let m = Matrix::new(0.7);
        let v = Vec2::new(3.0, -2.0);
        let back = m.inverse().rotate(m.rotate(v));
        assert!((back.x - v.x).abs() < 1e-4);
        assert!((back.y - v.y).abs() < 1e-4);
    }
}
