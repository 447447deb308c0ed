//! Game configuration and its validation.

use shared::{MAX_BOARD_DIM, MIN_BOARD_DIM, SIDEBAR_WIDTH};
use std::time::Duration;
use thiserror::Error;

/// Problems with operator-supplied settings. Always fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "invalid board dimensions {width}x{height}: both must be even and between {} and {}",
        MIN_BOARD_DIM,
        MAX_BOARD_DIM
    )]
    InvalidDimensions { width: usize, height: usize },
    #[error("player count {0} must be between 1 and 255")]
    InvalidPlayerCount(usize),
    #[error("tick interval must be non-zero")]
    InvalidTick,
}

/// Checks a board size without building a grid.
pub fn validate_dimensions(width: usize, height: usize) -> Result<(), ConfigError> {
    let in_range = |d: usize| (MIN_BOARD_DIM..=MAX_BOARD_DIM).contains(&d) && d % 2 == 0;
    if in_range(width) && in_range(height) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimensions { width, height })
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Board width in cells.
    pub width: usize,
    /// Board height in cells. Two cells share one terminal row.
    pub height: usize,
    pub max_players: usize,
    /// Fixed simulation interval.
    pub tick: Duration,
    /// How long a dead player's trail stays on the board. Respawning is
    /// blocked for the same period.
    pub respawn_delay: Duration,
    /// Kick a player after this many deaths in one session.
    pub max_deaths: Option<u32>,
    pub respawn_attempts: usize,
    pub respawn_lookahead: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 60,
            max_players: 4,
            tick: Duration::from_millis(25),
            respawn_delay: Duration::from_secs(1),
            max_deaths: None,
            respawn_attempts: 100,
            respawn_lookahead: 15,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)?;
        if self.max_players == 0 || self.max_players > 255 {
            return Err(ConfigError::InvalidPlayerCount(self.max_players));
        }
        if self.tick.is_zero() {
            return Err(ConfigError::InvalidTick);
        }
        Ok(())
    }

    /// Terminal columns needed to show the sidebar and the whole board.
    pub fn required_cols(&self) -> usize {
        self.width + SIDEBAR_WIDTH
    }

    /// Terminal rows needed to show the whole board.
    pub fn required_rows(&self) -> usize {
        self.height / 2
    }
}
