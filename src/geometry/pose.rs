// World-frame pose and body-frame twist

use serde::{Deserialize, Serialize};

use super::Vector2;

/// Below this |dθ| the exponential map switches to its Taylor expansion
const SMALL_ANGLE: f64 = 1e-9;

/// Position in meters, heading in radians.
///
/// `theta` is never wrapped; it accumulates across full turns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2 {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Displacement expressed in the body frame over one interval
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2 {
    pub dx: f64,
    pub dy: f64,
    pub dtheta: f64,
}

impl Twist2 {
    pub const fn new(dx: f64, dy: f64, dtheta: f64) -> Self {
        Self { dx, dy, dtheta }
    }
}

impl Pose2 {
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn heading_deg(&self) -> f64 {
        self.theta.to_degrees()
    }

    /// Apply a body-frame twist using the SE(2) exponential map.
    ///
    /// Exact for a constant body velocity held over the interval.
    pub fn exp(&self, twist: Twist2) -> Pose2 {
        let Twist2 { dx, dy, dtheta } = twist;
        let (sin, cos) = dtheta.sin_cos();

        let (s, c) = if dtheta.abs() < SMALL_ANGLE {
            (1.0 - dtheta * dtheta / 6.0, 0.5 * dtheta)
        } else {
            (sin / dtheta, (1.0 - cos) / dtheta)
        };

        let local = Vector2::new(dx * s - dy * c, dx * c + dy * s);
        let world = local.rotate_radians(self.theta);

        Pose2 {
            x: self.x + world.x,
            y: self.y + world.y,
            theta: self.theta + dtheta,
        }
    }
}
