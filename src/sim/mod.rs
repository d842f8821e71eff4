//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn-order slots, timers by due time then id)
//! - No rendering or platform dependencies

pub mod boss;
pub mod collision;
pub mod levels;
pub mod powerup;
pub mod registry;
pub mod scheduler;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{BossPhase, BossState};
pub use collision::{CollisionPairs, CollisionResult, Platform};
pub use levels::{BOSS_LEVELS, LEVEL_COUNT, Level, LevelError, level_params};
pub use powerup::{PowerUp, PowerUpController, PowerUpId, PowerUpKind};
pub use registry::{Entity, EntityId, EntityKind, EntityRegistry};
pub use scheduler::{Scheduler, TimerEvent, TimerId};
pub use scoring::{ComboState, KillContext, on_kill};
pub use spawn::spawn_level;
pub use state::{GameEvent, GamePhase, GameState, SoundCue};
pub use tick::{KillCause, TickInput, restart, tick};
