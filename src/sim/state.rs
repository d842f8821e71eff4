//! Game state and core simulation types
//!
//! Everything the session owns lives in `GameState`, which is passed by
//! `&mut` to each subsystem. Hosts read `events` for presentation cues.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::BossState;
use super::collision::CollisionPairs;
use super::levels::{self, Level};
use super::powerup::{PowerUpController, PowerUpId, PowerUpKind};
use super::registry::{EntityId, EntityRegistry};
use super::scheduler::Scheduler;
use super::scoring::ComboState;
use crate::settings::Settings;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Logo shown, waiting for the start tap
    Idle,
    /// Active gameplay
    Playing,
    /// Final level cleared in time
    Won,
    /// Ran out of time
    Lost,
}

/// Sounds the host should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Soundtrack,
    Explosion,
    GameOver,
    PowerUp,
    BossWarning,
    Victory,
}

/// Presentation cues emitted by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: usize, boss: bool },
    LevelCleared { level: usize },
    Explosion { pos: Vec2, scale: f32 },
    Shake { intensity: f32, duration_ms: u32 },
    Sound(SoundCue),
    Scored { entity: EntityId, points: u64, combo: u32 },
    BossWarning { boss_index: usize },
    BossActivated { entity: EntityId, max_health: u32 },
    BossHit { health: u32, max_health: u32, points: u64 },
    BossDefeated { boss_index: usize, bonus: u64 },
    PowerUpSpawned {
        id: PowerUpId,
        kind: PowerUpKind,
        pos: Vec2,
        expires_at_ms: u64,
    },
    PowerUpCollected { id: PowerUpId, kind: PowerUpKind },
    PowerUpExpired { id: PowerUpId },
    FreezeStarted,
    FreezeEnded,
    BoostStarted { refreshed: bool },
    BoostEnded,
    Won { score: u64 },
    Lost { score: u64 },
}

/// Complete game session (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed; restart reseeds from it so replays match
    pub seed: u64,
    pub rng: Pcg32,
    /// Current level index (0-based)
    pub level: usize,
    pub score: u64,
    pub phase: GamePhase,
    pub sound_enabled: bool,
    /// Shake cues are dropped when false
    pub shake_enabled: bool,
    /// Guards the clear check while the next level is pending
    pub level_transitioning: bool,
    /// Clock reading when the run started. Every level's time limit is
    /// measured from here; only start and restart move it.
    pub start_ms: u64,
    /// Simulation clock
    pub now_ms: u64,
    pub registry: EntityRegistry,
    pub combo: ComboState,
    pub powerups: PowerUpController,
    /// Present only on boss levels
    pub boss: Option<BossState>,
    pub scheduler: Scheduler,
    pub collision_pairs: CollisionPairs,
    /// Autoplay cadence
    pub autoplay_interval_ms: u64,
    pub next_autoplay_ms: u64,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

/// Default autoplay tap cadence
pub const AUTOPLAY_INTERVAL_MS: u64 = 250;

impl GameState {
    /// Create a new idle session with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level: 0,
            score: 0,
            phase: GamePhase::Idle,
            sound_enabled: true,
            shake_enabled: true,
            level_transitioning: false,
            start_ms: 0,
            now_ms: 0,
            registry: EntityRegistry::new(),
            combo: ComboState::default(),
            powerups: PowerUpController::default(),
            boss: None,
            scheduler: Scheduler::new(),
            collision_pairs: CollisionPairs::default(),
            autoplay_interval_ms: AUTOPLAY_INTERVAL_MS,
            next_autoplay_ms: 0,
            events: Vec::new(),
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sound_enabled = settings.sound_enabled;
        self.shake_enabled = settings.effective_screen_shake();
        self.autoplay_interval_ms = settings.autoplay_tap_interval_ms.max(1);
    }

    /// Parameters of the current level (None once past the table)
    pub fn current_level(&self) -> Option<Level> {
        levels::level_params(self.level).ok()
    }

    pub fn is_final_level(&self) -> bool {
        self.level >= levels::final_level_index()
    }

    /// Time since the run started
    pub fn elapsed_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.start_ms)
    }

    /// Run timer as `MM:SS:CC`
    pub fn timer_text(&self) -> String {
        format_timer(self.elapsed_ms())
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Emit a sound cue if sound is on
    pub fn play(&mut self, cue: SoundCue) {
        if self.sound_enabled {
            self.events.push(GameEvent::Sound(cue));
        }
    }

    /// Emit a camera shake if shake is on
    pub fn shake(&mut self, intensity: f32, duration_ms: u32) {
        if self.shake_enabled {
            self.events.push(GameEvent::Shake {
                intensity,
                duration_ms,
            });
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Restore the RNG to the run seed
    pub fn reseed(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
    }
}

/// Format milliseconds as `MM:SS:CC`
pub fn format_timer(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let centis = (ms % 1000) / 10;
    format!("{:02}:{:02}:{:02}", minutes, seconds, centis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.score, 0);
        assert!(state.registry.is_empty());
        assert_eq!(state.current_level().map(|l| l.ball_count), Some(4));
    }

    #[test]
    fn test_format_timer() {
        assert_eq!(format_timer(0), "00:00:00");
        assert_eq!(format_timer(12_345), "00:12:34");
        assert_eq!(format_timer(61_070), "01:01:07");
    }

    #[test]
    fn test_cues_respect_preferences() {
        let mut state = GameState::new(1);
        state.sound_enabled = false;
        state.shake_enabled = false;
        state.play(SoundCue::Explosion);
        state.shake(4.0, 80);
        assert!(state.drain_events().is_empty());

        state.sound_enabled = true;
        state.play(SoundCue::Explosion);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::Sound(SoundCue::Explosion)]
        );
    }

    #[test]
    fn test_apply_settings() {
        let mut state = GameState::new(1);
        let settings = Settings {
            sound_enabled: false,
            reduced_motion: true,
            ..Settings::default()
        };
        state.apply_settings(&settings);
        assert!(!state.sound_enabled);
        assert!(!state.shake_enabled);
    }
}
