// Forward dynamics for the kiwi base
// Integrates chassis velocity from the drive's last wheel outputs and
// composes the resulting pose with the SE(2) exponential map.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::drive::{WheelCommandSource, WheelOutputs};
use crate::geometry::{Pose2, Twist2, Vector2};

/// Velocity retained after each tick. Applied per tick, not per second, so
/// the effective friction depends on the loop rate.
pub const DAMPING_FACTOR: f64 = 0.98;

/// Rejected physical parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Physical parameters of the simulated chassis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimParams {
    pub mass: f64,              // kg
    pub moment_of_inertia: f64, // kg·m²
    pub wheel_force: f64,       // N per wheel at full output
    pub radius: f64,            // m, center to each wheel
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            mass: 50.0,
            moment_of_inertia: 10.0,
            wheel_force: 100.0,
            radius: 0.5,
        }
    }
}

impl SimParams {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("mass", self.mass, true),
            ("moment_of_inertia", self.moment_of_inertia, true),
            ("wheel_force", self.wheel_force, false),
            ("radius", self.radius, true),
        ];
        for (name, value, must_be_positive) in checks {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
            if must_be_positive && value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

/// Chassis-frame velocity (m/s, m/s, rad/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisState {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

/// Net chassis-frame force and torque about the center
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wrench {
    pub force: Vector2,
    pub torque: f64,
}

pub struct KilloughDriveSim {
    params: SimParams,
    positions: [Vector2; 3],
    directions: [Vector2; 3],
    chassis: ChassisState,
    pose: Pose2,
}

impl KilloughDriveSim {
    /// Build a simulator for the geometry of `source`.
    ///
    /// The source is only read here for its wheel layout; `update` samples
    /// its outputs each tick.
    pub fn new<S: WheelCommandSource + ?Sized>(source: &S, params: SimParams) -> Result<Self> {
        params.validate()?;

        let geometry = source.geometry();
        let directions = geometry.directions();
        let positions = directions.map(|d| d.scale(params.radius));

        info!(
            "Simulator ready: mass={}kg inertia={}kg·m² wheel_force={}N radius={}m angles={:?}",
            params.mass,
            params.moment_of_inertia,
            params.wheel_force,
            params.radius,
            geometry.angles_deg()
        );

        Ok(Self {
            params,
            positions,
            directions,
            chassis: ChassisState::default(),
            pose: Pose2::default(),
        })
    }

    /// Force and torque produced by a set of wheel outputs
    pub fn wrench(&self, outputs: WheelOutputs) -> Wrench {
        let mut wrench = Wrench::default();
        for i in 0..3 {
            let force = self.directions[i].scale(outputs.0[i] * self.params.wheel_force);
            wrench.force = wrench.force + force;
            wrench.torque += self.positions[i].cross(force);
        }
        wrench
    }

    /// Advance one tick of `dt` seconds using the source's last outputs.
    ///
    /// Must run after the drive has been commanded for this tick.
    pub fn update<S: WheelCommandSource + ?Sized>(&mut self, source: &S, dt: f64) {
        let Wrench { force, torque } = self.wrench(source.last_command());

        let ax = force.x / self.params.mass;
        let ay = force.y / self.params.mass;
        let alpha = torque / self.params.moment_of_inertia;

        let c = &mut self.chassis;
        c.vx = (c.vx + ax * dt) * DAMPING_FACTOR;
        c.vy = (c.vy + ay * dt) * DAMPING_FACTOR;
        c.omega = (c.omega + alpha * dt) * DAMPING_FACTOR;

        self.pose = self
            .pose
            .exp(Twist2::new(c.vx * dt, c.vy * dt, c.omega * dt));

        debug!(
            "Sim pose: x={:.3} y={:.3} theta={:.3}rad",
            self.pose.x, self.pose.y, self.pose.theta
        );
    }

    /// World pose; theta in radians
    pub fn pose(&self) -> Pose2 {
        self.pose
    }

    pub fn chassis(&self) -> ChassisState {
        self.chassis
    }

    pub fn wheel_positions(&self) -> [Vector2; 3] {
        self.positions
    }
}
