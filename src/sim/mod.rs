// Standalone forward-dynamics simulator of the kiwi base
//
// Reads the drive's last wheel outputs each tick, never writes back.

mod killough_sim;

pub use killough_sim::{
    ChassisState, ConfigError, KilloughDriveSim, SimParams, Wrench, DAMPING_FACTOR,
};
