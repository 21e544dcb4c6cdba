// Killough (kiwi) drive inverse kinematics
// Converts a velocity command (x forward, y right, omega) into three
// normalized wheel outputs and dispatches them to the motor sinks.

use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use tracing::debug;

use super::sink::MotorSink;
use crate::geometry::{Pose2, Vector2};

/// Wheel mounting angles (degrees, clockwise from forward)
pub const DEFAULT_WHEEL_ANGLES_DEG: [f64; 3] = [120.0, -120.0, 0.0];

/// Fixed wheel layout, derived once at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    angles_deg: [f64; 3],
    directions: [Vector2; 3],
    // Row i: [cos(a_i), sin(a_i), 1]. The rotation term is 1 because every
    // wheel is assumed to sit at the same distance from the center.
    transform: [[f64; 3]; 3],
}

impl WheelGeometry {
    pub fn new(angles_deg: [f64; 3]) -> Self {
        let directions = angles_deg.map(Vector2::from_angle_deg);
        let transform = directions.map(|d| [d.x, d.y, 1.0]);
        Self {
            angles_deg,
            directions,
            transform,
        }
    }

    pub fn angles_deg(&self) -> [f64; 3] {
        self.angles_deg
    }

    /// Unit direction `(cos a, sin a)` of each wheel
    pub fn directions(&self) -> [Vector2; 3] {
        self.directions
    }

    pub fn transform(&self) -> [[f64; 3]; 3] {
        self.transform
    }

    /// Un-normalized wheel speeds `T · (vx, vy, omega)`
    pub fn raw_wheel_speeds(&self, vx: f64, vy: f64, omega: f64) -> [f64; 3] {
        self.transform
            .map(|row| row[0] * vx + row[1] * vy + row[2] * omega)
    }
}

impl Default for WheelGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_WHEEL_ANGLES_DEG)
    }
}

/// Normalized wheel outputs in wheel-geometry order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelOutputs(pub [f64; 3]);

impl WheelOutputs {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    pub fn max_abs(&self) -> f64 {
        self.0.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}

/// Scale all three speeds down together if any exceeds 1.
///
/// Components are never clamped individually so the commanded heading
/// survives saturation.
pub fn normalize(speeds: [f64; 3]) -> [f64; 3] {
    let max_speed = speeds.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if max_speed > 1.0 {
        debug!("Normalizing wheel speeds by {:.3}", max_speed);
        speeds.map(|s| s / max_speed)
    } else {
        speeds
    }
}

/// Velocity command, each component conventionally in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriveCommand {
    pub x_speed: f64, // forward
    pub y_speed: f64, // right
    pub omega: f64,
    /// World heading for field-oriented control; `None` drives robot-relative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gyro_angle_deg: Option<f64>,
}

impl DriveCommand {
    pub fn new(x_speed: f64, y_speed: f64, omega: f64) -> Self {
        Self {
            x_speed,
            y_speed,
            omega,
            gyro_angle_deg: None,
        }
    }

    pub fn with_gyro(mut self, gyro_angle_deg: f64) -> Self {
        self.gyro_angle_deg = Some(gyro_angle_deg);
        self
    }
}

/// Read-only view of a drive consumed by the simulator
pub trait WheelCommandSource {
    fn geometry(&self) -> &WheelGeometry;

    /// Outputs most recently dispatched to the motors
    fn last_command(&self) -> WheelOutputs;
}

/// Snapshot for dashboards; observers never write back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveTelemetry {
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
    pub motor_outputs: [f64; 3],
}

/// Three-wheel omni drive owning its motor sinks
pub struct KilloughDrive<M: MotorSink> {
    geometry: WheelGeometry,
    motors: [M; 3],
    last_outputs: WheelOutputs,
    odometry: Pose2,
}

impl<M: MotorSink> KilloughDrive<M> {
    /// Create with the default `[120, -120, 0]` layout
    pub fn new(motors: [M; 3]) -> Self {
        Self::with_angles(motors, DEFAULT_WHEEL_ANGLES_DEG)
    }

    /// Create with custom wheel angles, in the same order as `motors`
    pub fn with_angles(motors: [M; 3], angles_deg: [f64; 3]) -> Self {
        Self {
            geometry: WheelGeometry::new(angles_deg),
            motors,
            last_outputs: WheelOutputs::zero(),
            odometry: Pose2::default(),
        }
    }

    /// Robot-relative cartesian drive. Equivalent to a gyro angle of 0.
    pub fn drive_cartesian(&mut self, y_speed: f64, x_speed: f64, omega: f64) -> WheelOutputs {
        self.drive_cartesian_field_oriented(y_speed, x_speed, omega, 0.0)
    }

    /// Cartesian drive with the command expressed in the field frame.
    ///
    /// `(x_speed, y_speed)` is rotated by `gyro_angle_deg` into the robot
    /// frame before the wheel transform is applied.
    pub fn drive_cartesian_field_oriented(
        &mut self,
        y_speed: f64,
        x_speed: f64,
        omega: f64,
        gyro_angle_deg: f64,
    ) -> WheelOutputs {
        let robot = Vector2::new(x_speed, y_speed).rotate(gyro_angle_deg);
        let outputs = self.wheel_speeds(robot.x, robot.y, omega);
        self.dispatch(outputs);
        outputs
    }

    /// Polar drive; never field-oriented.
    ///
    /// The magnitude is clamped to [-1, 1] and scaled by √2 so a unit command
    /// still saturates a wheel after decomposition.
    pub fn drive_polar(&mut self, magnitude: f64, angle_deg: f64, z_rotation: f64) -> WheelOutputs {
        let magnitude = magnitude.clamp(-1.0, 1.0) * SQRT_2;
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        self.drive_cartesian(magnitude * sin, magnitude * cos, z_rotation)
    }

    pub fn drive(&mut self, cmd: &DriveCommand) -> WheelOutputs {
        self.drive_cartesian_field_oriented(
            cmd.y_speed,
            cmd.x_speed,
            cmd.omega,
            cmd.gyro_angle_deg.unwrap_or(0.0),
        )
    }

    /// Normalized wheel speeds for a robot-frame command, without dispatching
    pub fn wheel_speeds(&self, vx: f64, vy: f64, omega: f64) -> WheelOutputs {
        WheelOutputs(normalize(self.geometry.raw_wheel_speeds(vx, vy, omega)))
    }

    fn dispatch(&mut self, outputs: WheelOutputs) {
        debug!(
            "Setting wheel outputs: [{:.3}, {:.3}, {:.3}]",
            outputs.0[0], outputs.0[1], outputs.0[2]
        );
        for (motor, &value) in self.motors.iter_mut().zip(outputs.0.iter()) {
            motor.set(value);
        }
        self.last_outputs = outputs;
    }

    /// Advance the odometry estimate by one interval.
    ///
    /// Never called by the drive methods: callers that want a position
    /// estimate must tick this themselves with the matching velocities.
    ///
    /// Translation is rotated by the heading at the start of the interval and
    /// theta advances afterwards. A turn-first integrator, which rotates
    /// translation by the already-advanced heading, disagrees with this one
    /// by `omega * dt` of rotation per tick.
    pub fn update_odometry(&mut self, vx: f64, vy: f64, omega: f64, dt: f64) {
        let pose = &mut self.odometry;
        let (sin, cos) = pose.theta.sin_cos();
        pose.x += (vx * cos - vy * sin) * dt;
        pose.y += (vx * sin + vy * cos) * dt;
        pose.theta += omega * dt;
    }

    /// Odometry estimate; theta in radians
    pub fn position(&self) -> Pose2 {
        self.odometry
    }

    pub fn motors(&self) -> &[M; 3] {
        &self.motors
    }

    pub fn telemetry(&self) -> DriveTelemetry {
        DriveTelemetry {
            x: self.odometry.x,
            y: self.odometry.y,
            heading_deg: self.odometry.heading_deg(),
            motor_outputs: self.last_outputs.0,
        }
    }
}

impl<M: MotorSink> WheelCommandSource for KilloughDrive<M> {
    fn geometry(&self) -> &WheelGeometry {
        &self.geometry
    }

    fn last_command(&self) -> WheelOutputs {
        self.last_outputs
    }
}
