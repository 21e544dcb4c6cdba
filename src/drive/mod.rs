// Drive control for the kiwi base
//
// Provides:
// - Killough (kiwi) inverse kinematics with field-oriented control
// - Motor sink capability and a recording (simulated) motor

pub mod killough;
mod sink;

pub use killough::{
    normalize, DriveCommand, DriveTelemetry, KilloughDrive, WheelCommandSource, WheelGeometry,
    WheelOutputs, DEFAULT_WHEEL_ANGLES_DEG,
};
pub use sink::{MotorSink, RecordingMotor};
