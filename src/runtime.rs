// Fixed-rate simulation loop with watchdog
// Each tick: drain commands, drive, then simulate, then publish. The simulator
// samples the drive's last outputs, so that order never changes.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, TOPIC_CMD_DRIVE, TOPIC_HEALTH, TOPIC_TELEMETRY};
use crate::drive::{KilloughDrive, RecordingMotor};
use crate::messages::{CommandMessage, RuntimeHealth, Telemetry};
use crate::sim::{ConfigError, KilloughDriveSim};

pub struct Runtime {
    drive: KilloughDrive<RecordingMotor>,
    sim: KilloughDriveSim,
    latest_cmd: Option<CommandMessage>,
    cmd_received_at: Instant,
    cmd_timeout: Duration,
    dt: f64,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let drive = KilloughDrive::with_angles([RecordingMotor::new(); 3], config.wheel_angles_deg);
        let sim = KilloughDriveSim::new(&drive, config.sim)?;
        Ok(Self {
            drive,
            sim,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            cmd_timeout: config.cmd_timeout(),
            dt: config.tick_period().as_secs_f64(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        })
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: CommandMessage, now: Instant) {
        debug!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Pick the command for this tick based on watchdog state
    fn current_command(&mut self, now: Instant) -> CommandMessage {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        match self.latest_cmd {
            Some(cmd) if cmd_age <= self.cmd_timeout => {
                if self.health != RuntimeHealth::Ok {
                    info!("Commands flowing, health ok");
                }
                self.health = RuntimeHealth::Ok;
                cmd
            }
            Some(_) => {
                // Watchdog triggered - stop the robot
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Command stale ({:?} old), stopping robot", cmd_age);
                }
                self.health = RuntimeHealth::CmdStale;
                CommandMessage::default()
            }
            None => {
                // No command ever received
                self.health = RuntimeHealth::CmdStale;
                CommandMessage::default()
            }
        }
    }

    /// Run one control tick: command the drive, then advance the simulator
    pub fn step(&mut self, now: Instant) -> Telemetry {
        match self.current_command(now) {
            CommandMessage::Cartesian(cmd) => {
                self.drive.drive(&cmd);
            }
            CommandMessage::Polar(cmd) => {
                self.drive.drive_polar(cmd.magnitude, cmd.angle_deg, cmd.rotation);
            }
        }

        self.sim.update(&self.drive, self.dt);

        // The drive's own odometry only moves when ticked; feed it the sim's velocity
        let chassis = self.sim.chassis();
        self.drive
            .update_odometry(chassis.vx, chassis.vy, chassis.omega, self.dt);

        self.telemetry()
    }

    pub fn telemetry(&self) -> Telemetry {
        let pose = self.sim.pose();
        Telemetry {
            x: pose.x,
            y: pose.y,
            theta: pose.theta,
            heading_deg: pose.heading_deg(),
            chassis: self.sim.chassis(),
            drive: self.drive.telemetry(),
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn drive(&self) -> &KilloughDrive<RecordingMotor> {
        &self.drive
    }
}

pub async fn run(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.validate()?;
    let mut runtime = Runtime::new(&config)?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_DRIVE).await?;
    let pub_telemetry = session.declare_publisher(TOPIC_TELEMETRY).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut tick = interval(config.tick_period());

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        config.loop_hz, config.cmd_timeout_ms
    );
    info!("Subscribed to: {}", TOPIC_CMD_DRIVE);
    info!("Publishing to: {}, {}", TOPIC_TELEMETRY, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<CommandMessage>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd, Instant::now());
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Drive then simulate (includes watchdog logic)
        let telemetry = runtime.step(Instant::now());

        // 3. Publish telemetry
        let telemetry_json = serde_json::to_string(&telemetry)?;
        pub_telemetry.put(telemetry_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::DriveCommand;
    use crate::messages::PolarCommand;

    fn forward() -> CommandMessage {
        CommandMessage::Cartesian(DriveCommand::new(1.0, 0.0, 0.0))
    }

    #[test]
    fn test_stale_until_first_command() {
        let mut rt = Runtime::new(&RuntimeConfig::default()).expect("default config");
        let t = rt.step(Instant::now());
        assert_eq!(rt.health(), RuntimeHealth::CmdStale);
        assert_eq!(t.drive.motor_outputs, [0.0, 0.0, 0.0]);
        assert_eq!((t.x, t.y, t.theta), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_fresh_command_drives_forward() {
        let mut rt = Runtime::new(&RuntimeConfig::default()).expect("default config");
        let start = Instant::now();
        rt.on_command(forward(), start);

        let mut t = rt.step(start);
        assert_eq!(rt.health(), RuntimeHealth::Ok);
        for i in 1..10 {
            t = rt.step(start + Duration::from_millis(20 * i));
        }
        assert!(t.x > 0.0, "expected forward motion, got {:?}", t);
        assert!(t.chassis.vx > 0.0);
        assert!((t.drive.motor_outputs[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_watchdog_zeroes_outputs() {
        let mut rt = Runtime::new(&RuntimeConfig::default()).expect("default config");
        let start = Instant::now();
        rt.on_command(forward(), start);
        rt.step(start);

        let t = rt.step(start + Duration::from_millis(300));
        assert_eq!(rt.health(), RuntimeHealth::CmdStale);
        assert_eq!(t.drive.motor_outputs, [0.0, 0.0, 0.0]);
        // momentum remains and decays
        assert!(t.chassis.vx > 0.0);
    }

    #[test]
    fn test_gyro_comes_only_from_the_command() {
        let config = RuntimeConfig {
            wheel_angles_deg: [90.0, -30.0, 200.0],
            ..RuntimeConfig::default()
        };
        let start = Instant::now();
        let mut expected = KilloughDrive::with_angles([RecordingMotor::new(); 3], [90.0, -30.0, 200.0]);

        // Robot-relative without a gyro angle
        let mut rt = Runtime::new(&config).expect("valid config");
        rt.on_command(forward(), start);
        let t = rt.step(start);
        assert_eq!(t.drive.motor_outputs, expected.drive_cartesian(0.0, 1.0, 0.0).0);

        // A supplied heading rotates the command, whatever the sim heading is
        let mut rt = Runtime::new(&config).expect("valid config");
        let oriented = DriveCommand::new(1.0, 0.0, 0.0).with_gyro(90.0);
        rt.on_command(CommandMessage::Cartesian(oriented), start);
        let t = rt.step(start);
        let want = expected.drive_cartesian_field_oriented(0.0, 1.0, 0.0, 90.0);
        assert_eq!(t.drive.motor_outputs, want.0);
        assert!(t.theta.abs() < 1e-9, "sim heading stays at 0 with radial wheel forces");
    }

    #[test]
    fn test_polar_command() {
        let mut rt = Runtime::new(&RuntimeConfig::default()).expect("default config");
        let start = Instant::now();
        let polar = CommandMessage::Polar(PolarCommand {
            magnitude: 1.0,
            angle_deg: 0.0,
            rotation: 0.0,
        });
        rt.on_command(polar, start);
        let t = rt.step(start);
        assert!((t.drive.motor_outputs[0] + 0.5).abs() < 1e-9);
        assert!((t.drive.motor_outputs[1] + 0.5).abs() < 1e-9);
        assert!((t.drive.motor_outputs[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_runtime_ticks_drive_odometry() {
        let mut rt = Runtime::new(&RuntimeConfig::default()).expect("default config");
        let start = Instant::now();
        rt.on_command(forward(), start);
        for i in 0..10 {
            rt.step(start + Duration::from_millis(20 * i));
        }
        let odom = rt.drive().position();
        let t = rt.telemetry();
        assert!(odom.x > 0.0);
        assert_eq!(t.drive.x, odom.x, "published odometry is the drive's own");
        // Euler odometry matches the exact pose on a straight line
        assert!((odom.x - t.x).abs() < 1e-9, "{} vs {}", odom.x, t.x);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.sim.mass = 0.0;
        assert!(Runtime::new(&config).is_err());
    }
}
