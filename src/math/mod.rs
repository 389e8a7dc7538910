//! Spatial primitives
//!
//! Plain 2D math used by the simulation core: vectors, rotation matrices
//! and axis-aligned boxes. Scene coordinates have +Y pointing down, so a
//! positive angle rotates clockwise on screen.

mod aabb;
mod matrix;
mod vector;

pub use aabb::Aabb;
pub use matrix::Matrix;
pub use vector::Vec2;

/// Ease-out curve on [0, 1] (fast start, slow finish).
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_endpoints() {
        assert!((ease_out(0.0)).abs() < 1e-6);
        assert!((ease_out(1.0) - 1.0).abs() < 1e-6);
        // Ease-out is ahead of linear in the middle
        assert!(ease_out(0.5) > 0.5);
    }

    #[test]
    fn test_ease_out_clamps() {
        assert_eq!(ease_out(-2.0), 0.0);
        assert_eq!(ease_out(3.0), 1.0);
    }
}
