// config.rs - Engine configuration: cell size bounds and loop cadences

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{LevelError, Result};

pub const DEFAULT_SIZE: u32 = 8;                      // Pixels per cell at level start
pub const MIN_SIZE: u32 = 2;
pub const MAX_SIZE: u32 = 16;
pub const TICK_INTERVAL: Duration = Duration::from_millis(90);   // One generation per tick
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);  // Render cadence, ~60 fps

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_size: u32,
    pub min_size: u32,
    pub max_size: u32,
    #[serde(with = "millis")]
    pub tick_interval: Duration,
    #[serde(with = "millis")]
    pub frame_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_SIZE,
            min_size: MIN_SIZE,
            max_size: MAX_SIZE,
            tick_interval: TICK_INTERVAL,
            frame_interval: FRAME_INTERVAL,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(LevelError::config("min_size must be at least 1"));
        }
        if !(self.min_size..=self.max_size).contains(&self.default_size) {
            return Err(LevelError::config(format!(
                "default_size {} outside [{}, {}]",
                self.default_size, self.min_size, self.max_size
            )));
        }
        if self.tick_interval.is_zero() || self.frame_interval.is_zero() {
            return Err(LevelError::config("intervals must be non-zero"));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
