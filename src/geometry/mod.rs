// Planar geometry shared by the drive and the simulator
//
// Provides:
// - Vector2 value type (rotate, dot, magnitude, projection)
// - Pose2 / Twist2 with the SE(2) exponential map

mod pose;
mod vector;

pub use pose::{Pose2, Twist2};
pub use vector::Vector2;
