use std::time::Duration;

use crate::game::traits::{PlayerId, TickRate};

/// How the engine reacts to a broken invariant while closing a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustMode {
    /// This process is the only writer; a broken invariant is a bug and panics.
    #[default]
    Authoritative,
    /// State may come from racy peers; broken updates are logged and dropped.
    Networked,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid must be at least 3x3, got {cols}x{rows}")]
    GridTooSmall { cols: u32, rows: u32 },
    #[error("max_players must be between 1 and {max}, got {got}")]
    PlayerCount { got: usize, max: usize },
    #[error("trail_max_len must be positive")]
    ZeroTrailLength,
    #[error("win_threshold {threshold} cannot be reached on a board of {tiles} tiles")]
    UnreachableWinThreshold { threshold: u32, tiles: u32 },
    #[error("tick_rate_hz must be positive")]
    ZeroTickRate,
    #[error("tick_rate_hz must be at most {max}, got {got}")]
    TickRateTooHigh { got: u32, max: u32 },
    #[error("grid of {cols}x{rows} tiles is too large")]
    GridTooLarge { cols: u32, rows: u32 },
}

#[derive(Debug, Clone)]
pub struct TerritoryConfig {
    /// Grid width in tiles
    pub num_cols: u32,
    /// Grid height in tiles
    pub num_rows: u32,
    /// Ticks a trail tile survives before turning back into empty ground
    pub trail_max_len: u32,
    /// Extra trail ticks granted by the long-trail pickup
    pub trail_powerup_len: u32,
    /// A player wins once their area is strictly greater than this
    pub win_threshold: u32,
    /// Server tick rate in Hz (ticks per second)
    pub tick_rate_hz: u32,
    /// Maximum number of players per game
    pub max_players: usize,
    /// Side of the starting territory square around a spawn point, 0 for none
    pub starting_territory_size: u32,
    /// Ticks between pickup spawns, 0 disables pickups
    pub powerup_interval_ticks: u32,
    /// Seed for pickup placement
    pub seed: u64,
    pub trust: TrustMode,
}

impl TerritoryConfig {
    pub const MAX_PLAYERS: usize = 4;
    /// Ticks shorter than a millisecond cannot be scheduled.
    pub const MAX_TICK_RATE_HZ: u32 = 1000;

    pub fn with_grid_size(cols: u32, rows: u32) -> Self {
        Self {
            num_cols: cols,
            num_rows: rows,
            win_threshold: cols.saturating_mul(rows) / 2,
            ..Default::default()
        }
    }

    /// Number of tiles on the board, `None` if it does not fit in a `u32`.
    pub fn total_tiles(&self) -> Option<u32> {
        self.num_cols.checked_mul(self.num_rows)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(1000 / self.tick_rate_hz as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cols < 3 || self.num_rows < 3 {
            return Err(ConfigError::GridTooSmall {
                cols: self.num_cols,
                rows: self.num_rows,
            });
        }
        if self.max_players == 0 || self.max_players > Self::MAX_PLAYERS {
            return Err(ConfigError::PlayerCount {
                got: self.max_players,
                max: Self::MAX_PLAYERS,
            });
        }
        if self.trail_max_len == 0 {
            return Err(ConfigError::ZeroTrailLength);
        }
        let tiles = self.total_tiles().ok_or(ConfigError::GridTooLarge {
            cols: self.num_cols,
            rows: self.num_rows,
        })?;
        if self.win_threshold >= tiles {
            return Err(ConfigError::UnreachableWinThreshold {
                threshold: self.win_threshold,
                tiles,
            });
        }
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            return Err(ConfigError::TickRateTooHigh {
                got: self.tick_rate_hz,
                max: Self::MAX_TICK_RATE_HZ,
            });
        }
        Ok(())
    }
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        Self {
            num_cols: 80,
            num_rows: 50,
            trail_max_len: 60,
            trail_powerup_len: 30,
            win_threshold: 80 * 50 / 2,
            tick_rate_hz: 10,
            max_players: 4,
            starting_territory_size: 3,
            powerup_interval_ticks: 100,
            seed: 0x5eed,
            trust: TrustMode::Authoritative,
        }
    }
}

impl TickRate for TerritoryConfig {
    fn tick_duration(&self) -> Duration {
        TerritoryConfig::tick_duration(self)
    }
}

pub const PLAYER_COLORS: [u32; 4] = [
    0x390099FF, // Indigo
    0x9E0059FF, // Plum
    0xFF0054FF, // Raspberry
    0xFF5400FF, // Orange
];

pub fn get_player_color(player_id: PlayerId) -> u32 {
    PLAYER_COLORS[(player_id as usize) % PLAYER_COLORS.len()]
}
