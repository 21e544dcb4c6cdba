// 2D vector in the robot convention: x forward, y right

use serde::{Deserialize, Serialize};

/// Immutable 2D vector. Every operation returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64, // forward
    pub y: f64, // right
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector `(cos θ, sin θ)` for an angle in degrees
    pub fn from_angle_deg(angle_deg: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Self::new(cos, sin)
    }

    /// Rotate counter-clockwise by `angle_deg` degrees
    pub fn rotate(self, angle_deg: f64) -> Self {
        self.rotate_radians(angle_deg.to_radians())
    }

    pub fn rotate_radians(self, angle_rad: f64) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Scalar projection of `self` onto `other`.
    ///
    /// Projecting onto a zero vector yields 0.
    pub fn scalar_project(self, other: Vector2) -> f64 {
        let mag = other.magnitude();
        if mag == 0.0 {
            return 0.0;
        }
        self.dot(other) / mag
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// z component of the 2D cross product `self × other`
    pub fn cross(self, other: Vector2) -> f64 {
        self.x * other.y - self.y * other.x
    }
}

impl std::ops::Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}
