// Loop timing, topics, and the runtime configuration file
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::drive::DEFAULT_WHEEL_ANGLES_DEG;
use crate::sim::{ConfigError, SimParams};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_DRIVE: &str = "kiwi/cmd/drive"; // commands
pub const TOPIC_TELEMETRY: &str = "kiwi/state/telemetry"; // pose, odometry, motor outputs
pub const TOPIC_HEALTH: &str = "kiwi/state/health"; // health status

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid simulator parameters: {0}")]
    Invalid(#[from] ConfigError),

    #[error("Loop rate must be between 1 Hz and 1 GHz, got {0}")]
    InvalidLoopRate(u64),
}

pub type Result<T> = std::result::Result<T, ConfigFileError>;

/// Everything the runtime needs, supplied once at startup.
///
/// Every field has a default, so a partial JSON file is valid. Unknown keys
/// are rejected so a misspelled setting never silently falls back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub loop_hz: u64,
    pub cmd_timeout_ms: u64,
    pub wheel_angles_deg: [f64; 3],
    pub sim: SimParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loop_hz: LOOP_HZ,
            cmd_timeout_ms: CMD_TIMEOUT.as_millis() as u64,
            wheel_angles_deg: DEFAULT_WHEEL_ANGLES_DEG,
            sim: SimParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: RuntimeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.loop_hz == 0 || self.tick_period().is_zero() {
            return Err(ConfigFileError::InvalidLoopRate(self.loop_hz));
        }
        self.sim.validate()?;
        Ok(())
    }

    /// Zero when `loop_hz` is 0 or above 1 GHz; `validate` rejects both
    pub fn tick_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000u64.checked_div(self.loop_hz).unwrap_or(0))
    }

    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_millis(self.cmd_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.loop_hz, 50);
        assert_eq!(config.cmd_timeout(), Duration::from_millis(250));
        assert_eq!(config.tick_period(), Duration::from_millis(20));
        assert_eq!(config.wheel_angles_deg, [120.0, -120.0, 0.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "loop_hz": 100, "sim": { "mass": 30.0 } }"#)
            .expect("valid config");
        assert_eq!(config.loop_hz, 100);
        assert_eq!(config.sim.mass, 30.0);
        assert_eq!(config.sim.radius, 0.5);
    }

    #[test]
    fn test_rejects_bad_sim_params() {
        let err = RuntimeConfig::from_json(r#"{ "sim": { "moment_of_inertia": -2.0 } }"#)
            .expect_err("negative inertia must be rejected");
        assert!(matches!(
            err,
            ConfigFileError::Invalid(ConfigError::NonPositive { name: "moment_of_inertia", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_loop_rate() {
        let err = RuntimeConfig::from_json(r#"{ "loop_hz": 0 }"#).expect_err("0 Hz is invalid");
        assert!(matches!(err, ConfigFileError::InvalidLoopRate(0)));
    }

    #[test]
    fn test_rejects_loop_rate_with_zero_period() {
        let config = RuntimeConfig {
            loop_hz: 2_000_000_000,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.tick_period(), Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigFileError::InvalidLoopRate(2_000_000_000))
        ));

        let fastest = RuntimeConfig {
            loop_hz: 1_000_000_000,
            ..RuntimeConfig::default()
        };
        assert_eq!(fastest.tick_period(), Duration::from_nanos(1));
        assert!(fastest.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = RuntimeConfig::from_json(r#"{ "field_oriented": true }"#)
            .expect_err("no such setting");
        assert!(matches!(err, ConfigFileError::Parse(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = RuntimeConfig::from_json("{ loop_hz: ").expect_err("not JSON");
        assert!(matches!(err, ConfigFileError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RuntimeConfig::load("/nonexistent/kiwi.json").expect_err("no such file");
        assert!(matches!(err, ConfigFileError::Io(_)));
    }
}
