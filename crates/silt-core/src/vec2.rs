//! Minimal 2-D vector for sub-cell offsets and velocities.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A 2-D vector.
///
/// Used for per-cell centre-of-mass offsets (confined to the unit box
/// around the cell centre) and accumulated velocities. `x` grows to the
/// right, `y` grows downward, matching grid row order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp both components into `[-0.5, 0.5]`, the valid range for a
    /// centre-of-mass offset within its cell.
    pub fn clamp_unit_box(self) -> Vec2 {
        Vec2::new(self.x.clamp(-0.5, 0.5), self.y.clamp(-0.5, 0.5))
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
