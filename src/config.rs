use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::global_variables::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_LOG_WINDOW, DEFAULT_PREDICTION_ALPHA,
    DEFAULT_TICK_INTERVAL_MS, REBOOT_DELAY_MS,
};

pub const ENV_CONFIG_PATH: &str = "TRAFFIC_CONFIG";
pub const ENV_SEED: &str = "TRAFFIC_SEED";
pub const ENV_TICK_MS: &str = "TRAFFIC_TICK_MS";
pub const ENV_MAX_TICKS: &str = "TRAFFIC_MAX_TICKS";

/// Runtime settings for the control center and its scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    /// Number of trailing log entries kept by the control center.
    pub log_window: usize,
    /// Seed for the simulation RNG. `None` draws one from OS entropy.
    pub seed: Option<u64>,
    pub reboot_delay_ms: u64,
    pub history_capacity: usize,
    /// Weight of the current sample when predicting congestion.
    pub prediction_alpha: f64,
    /// Directory receiving CSV exports. `None` disables exporting.
    pub export_dir: Option<PathBuf>,
    /// Stop after this many ticks. `None` runs until interrupted.
    pub max_ticks: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            log_window: DEFAULT_LOG_WINDOW,
            seed: None,
            reboot_delay_ms: REBOOT_DELAY_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            prediction_alpha: DEFAULT_PREDICTION_ALPHA,
            export_dir: None,
            max_ticks: None,
        }
    }
}

impl SimulationConfig {
    /// Reads a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the config from `TRAFFIC_CONFIG` (if set) and then applies
    /// the `TRAFFIC_SEED`, `TRAFFIC_TICK_MS` and `TRAFFIC_MAX_TICKS` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(ENV_CONFIG_PATH) {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => Self::default(),
        };
        if let Some(seed) = parse_env::<u64>(ENV_SEED)? {
            config.seed = Some(seed);
        }
        if let Some(tick_ms) = parse_env::<u64>(ENV_TICK_MS)? {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(max_ticks) = parse_env::<u64>(ENV_MAX_TICKS)? {
            config.max_ticks = Some(max_ticks);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "tick_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.log_window == 0 {
            return Err(ConfigError::Invalid {
                key: "log_window",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "history_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.prediction_alpha) {
            return Err(ConfigError::Invalid {
                key: "prediction_alpha",
                reason: format!("{} is outside [0, 1]", self.prediction_alpha),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn reboot_delay(&self) -> Duration {
        Duration::from_millis(self.reboot_delay_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: format!("{:?}: {}", raw, e),
            }),
        Err(_) => Ok(None),
    }
}
