//! Ball Popper - a tap-to-pop arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (levels, spawning, scoring, boss, power-ups)
//! - `settings`: Player preferences
//! - `highscores`: Local leaderboard
//! - `storage`: JSON file persistence shared by settings and high scores

pub mod highscores;
pub mod settings;
pub mod sim;
pub mod storage;

pub use highscores::HighScores;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (100 Hz keeps the clock in whole milliseconds)
    pub const SIM_DT: f32 = 1.0 / 100.0;
    /// Milliseconds advanced per fixed step
    pub const SIM_DT_MS: u64 = 10;

    /// Playfield dimensions
    pub const WORLD_WIDTH: f32 = 480.0;
    pub const WORLD_HEIGHT: f32 = 640.0;
    /// Physics bounds extend slightly past the visible field
    pub const BOUNDS_MIN: f32 = -10.0;
    pub const BOUNDS_MAX_X: f32 = 490.0;
    pub const BOUNDS_MAX_Y: f32 = 650.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 16.0;
    pub const BALL_SPEED: f32 = 160.0;

    /// Ledge the balls bounce off
    pub const PLATFORM_POS: (f32, f32) = (240.0, 450.0);
    pub const PLATFORM_HALF_EXTENTS: (f32, f32) = (32.0, 12.0);
}

/// Centre of the playfield
#[inline]
pub fn world_center() -> Vec2 {
    Vec2::new(consts::WORLD_WIDTH / 2.0, consts::WORLD_HEIGHT / 2.0)
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
