//! Per-game clock and session settings.
//!
//! ```rust
//! use sideline_core::config::GameConfig;
//!
//! let config = GameConfig::youth();
//! assert_eq!(config.half_length_seconds, Some(25 * 60));
//! ```

use serde::{Deserialize, Serialize};
use std::{env, fs};
use validator::Validate;

use crate::error::{GameError, Result};

pub const CONFIG_PATH_ENV: &str = "SIDELINE_CONFIG_PATH";

/// Runaway-clock ceiling, two hours of game time.
pub const DEFAULT_MAX_GAME_SECONDS: u32 = 7200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GameConfig {
    /// Length of one half. Required before kickoff.
    #[validate(range(min = 1))]
    pub half_length_seconds: Option<u32>,
    /// Running clocks are ended automatically here (default: 7200).
    #[validate(range(min = 1))]
    pub max_game_seconds: u32,
    /// Display tick (default: 1).
    #[validate(range(min = 1))]
    pub tick_interval_seconds: u32,
    /// Interval between persisted clock checkpoints (default: 5).
    #[validate(range(min = 1))]
    pub checkpoint_interval_seconds: u32,
    /// Resume pointers older than this are discarded (default: 12h).
    #[validate(range(min = 1))]
    pub resume_max_age_seconds: u32,
    /// Expected number of players on the field, if the format fixes it.
    #[validate(range(min = 1, max = 30))]
    pub players_on_field: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            half_length_seconds: None,
            max_game_seconds: DEFAULT_MAX_GAME_SECONDS,
            tick_interval_seconds: 1,
            checkpoint_interval_seconds: 5,
            resume_max_age_seconds: 12 * 60 * 60,
            players_on_field: None,
        }
    }
}

impl GameConfig {
    /// Small-sided youth format, 25-minute halves.
    pub fn youth() -> Self {
        Self { half_length_seconds: Some(25 * 60), players_on_field: Some(7), ..Self::default() }
    }

    /// Full-length match, 45-minute halves.
    pub fn standard() -> Self {
        Self { half_length_seconds: Some(45 * 60), players_on_field: Some(11), ..Self::default() }
    }

    /// One-minute halves with a ceiling that is actually reachable.
    pub fn testing() -> Self {
        Self { half_length_seconds: Some(60), max_game_seconds: 180, ..Self::default() }
    }

    pub fn with_half_length_minutes(mut self, minutes: u32) -> Self {
        self.half_length_seconds = Some(minutes * 60);
        self
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(content)
            .map_err(|e| GameError::Configuration(format!("Failed to parse config JSON: {}", e)))?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Load from the JSON file named by `SIDELINE_CONFIG_PATH`, or defaults
    /// when the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            GameError::Configuration(format!(
                "Failed to read config file from {CONFIG_PATH_ENV}='{path}': {e}"
            ))
        })?;

        log::info!("Loading game config from {}", path);
        Self::from_json(&content)
    }

    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .map_err(|e| GameError::Configuration(format!("Invalid game config: {}", e)))?;

        if self.checkpoint_interval_seconds < self.tick_interval_seconds {
            return Err(GameError::Configuration(format!(
                "checkpoint interval {}s is shorter than tick interval {}s",
                self.checkpoint_interval_seconds, self.tick_interval_seconds
            )));
        }

        if let Some(half) = self.half_length_seconds {
            if self.max_game_seconds <= half {
                return Err(GameError::Configuration(format!(
                    "max game seconds {} must exceed half length {}",
                    self.max_game_seconds, half
                )));
            }
        }

        Ok(())
    }

    pub fn require_half_length(&self) -> Result<u32> {
        self.half_length_seconds
            .ok_or_else(|| GameError::Configuration("half length is not configured".to_string()))
    }
}
