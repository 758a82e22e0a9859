use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::Position;

/// Largest supported grid edge
pub const MAX_GRID_SIZE: usize = 200;

/// Errors raised while building or loading a [`GameConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Grid edge below two cells leaves no room for food
    #[error("grid size {0} is too small, need at least 2")]
    GridTooSmall(usize),

    #[error("grid size {0} exceeds the maximum of {max}", max = MAX_GRID_SIZE)]
    GridTooLarge(usize),

    /// A duration setting was zero
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Edge length of the square grid
    pub grid_size: usize,
    /// Milliseconds between two game ticks
    pub tick_interval_ms: u64,
    /// Milliseconds without food before the tail is dropped
    pub food_timeout_ms: u64,
    /// Milliseconds between two rendered frames
    pub frame_interval_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            tick_interval_ms: 150,
            food_timeout_ms: 5000,
            frame_interval_ms: 33,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10)
    }

    /// Load a configuration from a JSON file and validate it. Missing
    /// fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a JSON file without validating it, so that
    /// callers can override fields before calling [`GameConfig::validate`].
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 2 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge(self.grid_size));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("tick interval"));
        }
        if self.food_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("food timeout"));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("frame interval"));
        }
        Ok(())
    }

    /// Cell where a fresh snake starts: the grid center
    pub fn start_position(&self) -> Position {
        let center = (self.grid_size / 2) as i32;
        Position::new(center, center)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn food_timeout(&self) -> Duration {
        Duration::from_millis(self.food_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
