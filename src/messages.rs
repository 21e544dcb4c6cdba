// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::drive::{DriveCommand, DriveTelemetry};
use crate::sim::ChassisState;

// Command from teleop/scripts -> runtime
// Told apart by their fields; a "mode": "polar" hint is accepted and ignored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandMessage {
    Polar(PolarCommand),
    Cartesian(DriveCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarCommand {
    pub magnitude: f64,
    pub angle_deg: f64,
    pub rotation: f64,
}

impl Default for CommandMessage {
    fn default() -> Self {
        CommandMessage::Cartesian(DriveCommand::default())
    }
}

// State published by runtime every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub x: f64,
    pub y: f64,
    pub theta: f64, // radians, unwrapped
    pub heading_deg: f64,
    pub chassis: ChassisState,
    pub drive: DriveTelemetry, // odometry estimate and last motor commands
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
