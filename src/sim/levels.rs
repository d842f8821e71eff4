//! Static level table
//!
//! Twelve levels, with bosses on every fourth one. Lookups past the end of the
//! table report `OutOfRange`, which callers read as "no more levels".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters of one configured wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub ball_count: u32,
    pub speed_multiplier: f32,
    pub time_limit_secs: u32,
    pub is_boss: bool,
}

impl Level {
    const fn new(ball_count: u32, speed_multiplier: f32, time_limit_secs: u32, is_boss: bool) -> Self {
        Self {
            ball_count,
            speed_multiplier,
            time_limit_secs,
            is_boss,
        }
    }

    /// Time budget in milliseconds
    pub fn time_limit_ms(&self) -> u64 {
        u64::from(self.time_limit_secs) * 1000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level index {index} is past the last level ({count} levels)")]
    OutOfRange { index: usize, count: usize },
}

/// Level indices that run a boss encounter instead of a normal spawn
pub const BOSS_LEVELS: [usize; 3] = [3, 7, 11];

const LEVELS: [Level; 12] = [
    Level::new(4, 1.0, 10, false),  // Tutorial
    Level::new(6, 1.05, 14, false),
    Level::new(8, 1.1, 18, false),
    Level::new(10, 1.15, 24, true),
    Level::new(8, 1.2, 18, false), // Reset after boss
    Level::new(10, 1.25, 22, false),
    Level::new(12, 1.3, 26, false),
    Level::new(14, 1.35, 32, true),
    Level::new(12, 1.4, 26, false), // Reset after boss
    Level::new(14, 1.45, 30, false),
    Level::new(16, 1.5, 36, false),
    Level::new(18, 1.6, 45, true), // Final boss
];

/// Number of levels in the table
pub const LEVEL_COUNT: usize = LEVELS.len();

/// Look up a level's parameters
pub fn level_params(index: usize) -> Result<Level, LevelError> {
    LEVELS.get(index).copied().ok_or(LevelError::OutOfRange {
        index,
        count: LEVEL_COUNT,
    })
}

/// Index of the last level
pub const fn final_level_index() -> usize {
    LEVEL_COUNT - 1
}

/// Position of a level within the boss set (0 for the first boss)
pub fn boss_index(level_index: usize) -> Option<usize> {
    BOSS_LEVELS.iter().position(|&l| l == level_index)
}
