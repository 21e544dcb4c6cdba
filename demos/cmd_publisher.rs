// Keyboard teleop for the kiwi runtime
//
//   W/S forward/back   A/D strafe   Z/X rotate   R/F speed level
//   P   toggle cartesian / polar commands
//   G   cycle the field heading sent as gyro angle (off, 90, 180, 270)
//   Q   quit
//
// Held keys repeat; once no movement key arrives for a short while the
// published command falls back to zero.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use kiwi_drive_runtime::config::TOPIC_CMD_DRIVE;
use kiwi_drive_runtime::drive::DriveCommand;
use kiwi_drive_runtime::messages::{CommandMessage, PolarCommand};
use std::time::{Duration, Instant};
use tracing::info;

// Normalized command levels in [-1, 1]
const LEVELS: [(&str, f64, f64); 3] = [("LOW", 0.25, 0.2), ("MED", 0.5, 0.5), ("HIGH", 1.0, 1.0)];
const FIELD_HEADINGS_DEG: [f64; 3] = [90.0, 180.0, 270.0];
const HOLD_TIMEOUT: Duration = Duration::from_millis(100);
const PUBLISH_PERIOD: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Cartesian,
    Polar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Continue,
    Quit,
}

/// Operator input state turned into one command per publish
#[derive(Debug)]
struct Teleop {
    // unit directions set by keys, scaled by the level when published
    forward: f64,
    right: f64,
    turn: f64,
    level: usize,
    mode: Mode,
    field_heading: Option<usize>,
    held_at: Option<Instant>,
}

impl Teleop {
    fn new() -> Self {
        Self {
            forward: 0.0,
            right: 0.0,
            turn: 0.0,
            level: 0,
            mode: Mode::Cartesian,
            field_heading: None,
            held_at: None,
        }
    }

    fn handle_key(&mut self, code: KeyCode, now: Instant) -> Action {
        let movement = match code {
            KeyCode::Char('w') => Some((&mut self.forward, 1.0)),
            KeyCode::Char('s') => Some((&mut self.forward, -1.0)),
            KeyCode::Char('d') => Some((&mut self.right, 1.0)),
            KeyCode::Char('a') => Some((&mut self.right, -1.0)),
            // omega is clockwise-positive
            KeyCode::Char('x') => Some((&mut self.turn, 1.0)),
            KeyCode::Char('z') => Some((&mut self.turn, -1.0)),
            _ => None,
        };
        if let Some((axis, value)) = movement {
            *axis = value;
            self.held_at = Some(now);
            return Action::Continue;
        }

        match code {
            KeyCode::Char('r') => {
                self.level = (self.level + 1).min(LEVELS.len() - 1);
                info!("Speed: {}", LEVELS[self.level].0);
            }
            KeyCode::Char('f') => {
                self.level = self.level.saturating_sub(1);
                info!("Speed: {}", LEVELS[self.level].0);
            }
            KeyCode::Char('p') => {
                self.mode = match self.mode {
                    Mode::Cartesian => Mode::Polar,
                    Mode::Polar => Mode::Cartesian,
                };
                info!("Mode: {:?}", self.mode);
            }
            KeyCode::Char('g') => {
                self.field_heading = match self.field_heading {
                    None => Some(0),
                    Some(i) if i + 1 < FIELD_HEADINGS_DEG.len() => Some(i + 1),
                    Some(_) => None,
                };
                match self.gyro_angle_deg() {
                    Some(deg) => info!("Field heading: {} deg", deg),
                    None => info!("Field heading: off (robot-relative)"),
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            _ => {}
        }
        Action::Continue
    }

    fn gyro_angle_deg(&self) -> Option<f64> {
        self.field_heading.map(|i| FIELD_HEADINGS_DEG[i])
    }

    fn command(&mut self, now: Instant) -> CommandMessage {
        let held = self
            .held_at
            .is_some_and(|at| now.saturating_duration_since(at) <= HOLD_TIMEOUT);
        if !held {
            self.forward = 0.0;
            self.right = 0.0;
            self.turn = 0.0;
        }

        let (_, speed, omega_speed) = LEVELS[self.level];
        let x_speed = self.forward * speed;
        let y_speed = self.right * speed;
        let omega = self.turn * omega_speed;

        match self.mode {
            // polar commands are always robot-relative
            Mode::Polar => CommandMessage::Polar(PolarCommand {
                magnitude: x_speed.hypot(y_speed).min(1.0),
                angle_deg: y_speed.atan2(x_speed).to_degrees(),
                rotation: omega,
            }),
            Mode::Cartesian => CommandMessage::Cartesian(DriveCommand {
                x_speed,
                y_speed,
                omega,
                gyro_angle_deg: self.gyro_angle_deg(),
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_DRIVE).await?;
    info!("Publishing drive commands to {}", TOPIC_CMD_DRIVE);
    info!("W/S/A/D move, Z/X rotate, R/F speed, P polar, G field heading, Q quit");

    enable_raw_mode()?;
    let mut teleop = Teleop::new();
    let result = async {
        loop {
            // Block at most one publish period waiting for a key
            if event::poll(PUBLISH_PERIOD)? {
                if let Event::Key(key) = event::read()? {
                    let pressed = matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat);
                    if pressed && teleop.handle_key(key.code, Instant::now()) == Action::Quit {
                        break;
                    }
                }
            }

            let cmd = teleop.command(Instant::now());
            publisher.put(serde_json::to_string(&cmd)?).await?;
        }
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    }
    .await;
    disable_raw_mode()?;

    // Leave the robot stopped rather than waiting for the watchdog
    let stop = CommandMessage::Cartesian(DriveCommand::default());
    publisher.put(serde_json::to_string(&stop)?).await?;

    result
}
