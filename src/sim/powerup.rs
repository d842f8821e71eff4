//! Power-up controller
//!
//! From level 2 on, a power-up drops every 5-10 seconds and sits on the field
//! for 8 seconds. Tapping one applies its effect:
//! - Time freeze: every live ball stops for 3 seconds
//! - Bomb: up to three random balls pop, one every 150 ms
//! - Score boost: kill scores double for 10 seconds

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::registry::{EntityId, EntityKind};
use super::scheduler::{Scheduler, TimerEvent, TimerId};
use super::state::{GameEvent, GamePhase, GameState, SoundCue};
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

pub type PowerUpId = u32;

/// First level with power-up drops
pub const POWERUP_MIN_LEVEL: usize = 2;
pub const SPAWN_DELAY_MIN_MS: u64 = 5000;
pub const SPAWN_DELAY_MAX_MS: u64 = 10_000;
pub const POWERUP_LIFETIME_MS: u64 = 8000;
pub const FREEZE_DURATION_MS: u64 = 3000;
pub const BOOST_DURATION_MS: u64 = 10_000;
pub const BOMB_TARGETS: usize = 3;
pub const BOMB_STAGGER_MS: u64 = 150;
/// Keep drops away from the screen edges
pub const POWERUP_MARGIN: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    TimeFreeze,
    Bomb,
    ScoreBoost,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::TimeFreeze,
        PowerUpKind::Bomb,
        PowerUpKind::ScoreBoost,
    ];
}

/// A collectible on the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: PowerUpId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub expires_at_ms: u64,
    expiry_timer: TimerId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpController {
    /// Uncollected power-ups, in drop order
    pub active: Vec<PowerUp>,
    next_id: PowerUpId,
    spawn_timer: Option<TimerId>,
    freeze_timer: Option<TimerId>,
    boost_timer: Option<TimerId>,
}

impl PowerUpController {
    pub fn freeze_active(&self) -> bool {
        self.freeze_timer.is_some()
    }

    pub fn boost_active(&self) -> bool {
        self.boost_timer.is_some()
    }

    pub fn get(&self, id: PowerUpId) -> Option<&PowerUp> {
        self.active.iter().find(|p| p.id == id)
    }

    /// Whether the next drop is queued
    pub fn spawn_armed(&self, scheduler: &Scheduler) -> bool {
        self.spawn_timer.is_some_and(|t| scheduler.is_pending(t))
    }
}

/// Queue the next drop unless one is already queued
pub fn arm(state: &mut GameState) {
    if state.powerups.spawn_armed(&state.scheduler) {
        return;
    }
    let delay = state.rng.random_range(SPAWN_DELAY_MIN_MS..SPAWN_DELAY_MAX_MS);
    let timer = state
        .scheduler
        .after(state.now_ms, delay, TimerEvent::PowerUpSpawn);
    state.powerups.spawn_timer = Some(timer);
    log::debug!("Next power-up in {}ms", delay);
}

/// Drop timer fired: place a power-up if there is anything to use it on, then re-arm
pub fn on_spawn_timer(state: &mut GameState) {
    state.powerups.spawn_timer = None;
    if state.phase != GamePhase::Playing {
        return;
    }
    if state.registry.live_count() > 0 {
        spawn_one(state);
    }
    arm(state);
}

fn spawn_one(state: &mut GameState) {
    let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
    let pos = Vec2::new(
        state
            .rng
            .random_range(POWERUP_MARGIN..WORLD_WIDTH - POWERUP_MARGIN),
        state
            .rng
            .random_range(POWERUP_MARGIN..WORLD_HEIGHT - POWERUP_MARGIN),
    );

    state.powerups.next_id += 1;
    let id = state.powerups.next_id;
    let expiry_timer = state.scheduler.after(
        state.now_ms,
        POWERUP_LIFETIME_MS,
        TimerEvent::PowerUpExpire { id },
    );
    let expires_at_ms = state.now_ms + POWERUP_LIFETIME_MS;
    state.powerups.active.push(PowerUp {
        id,
        kind,
        pos,
        expires_at_ms,
        expiry_timer,
    });
    log::debug!("Power-up {} ({:?}) at {:?}", id, kind, pos);
    state.emit(GameEvent::PowerUpSpawned {
        id,
        kind,
        pos,
        expires_at_ms,
    });
}

/// Uncollected power-up timed out
pub fn expire(state: &mut GameState, id: PowerUpId) {
    let before = state.powerups.active.len();
    state.powerups.active.retain(|p| p.id != id);
    if state.powerups.active.len() != before {
        state.emit(GameEvent::PowerUpExpired { id });
    }
}

/// Pick up a power-up and apply it. Returns false if it is not on the field.
pub fn collect(state: &mut GameState, id: PowerUpId) -> bool {
    let Some(idx) = state.powerups.active.iter().position(|p| p.id == id) else {
        return false;
    };
    let powerup = state.powerups.active.remove(idx);
    state.scheduler.cancel(powerup.expiry_timer);
    log::debug!("Collected power-up {} ({:?})", id, powerup.kind);
    state.emit(GameEvent::PowerUpCollected {
        id,
        kind: powerup.kind,
    });
    state.play(SoundCue::PowerUp);
    activate(state, powerup.kind);
    true
}

/// Apply an effect directly
pub fn activate(state: &mut GameState, kind: PowerUpKind) {
    match kind {
        PowerUpKind::TimeFreeze => {
            activate_time_freeze(state);
        }
        PowerUpKind::Bomb => activate_bomb(state),
        PowerUpKind::ScoreBoost => activate_score_boost(state),
    }
}

/// Stop all live balls. No-op (returns false) while a freeze is running.
pub fn activate_time_freeze(state: &mut GameState) -> bool {
    if state.powerups.freeze_active() {
        return false;
    }
    for entity in state.registry.iter_mut().filter(|e| e.alive) {
        entity.saved_vel = Some(entity.vel);
        entity.vel = Vec2::ZERO;
    }
    let timer = state
        .scheduler
        .after(state.now_ms, FREEZE_DURATION_MS, TimerEvent::FreezeEnd);
    state.powerups.freeze_timer = Some(timer);
    state.emit(GameEvent::FreezeStarted);
    true
}

pub fn end_freeze(state: &mut GameState) {
    if state.powerups.freeze_timer.take().is_none() {
        return;
    }
    restore_velocities(state);
    state.emit(GameEvent::FreezeEnded);
}

fn restore_velocities(state: &mut GameState) {
    for entity in state.registry.iter_mut() {
        if let Some(vel) = entity.saved_vel.take() {
            entity.vel = vel;
        }
    }
}

/// Queue staggered kills on up to three random live balls. The boss is never picked.
pub fn activate_bomb(state: &mut GameState) {
    let mut candidates: Vec<EntityId> = state
        .registry
        .live()
        .filter(|e| e.kind != EntityKind::Boss)
        .map(|e| e.id)
        .collect();

    let picks = candidates.len().min(BOMB_TARGETS);
    for i in 0..picks {
        let j = state.rng.random_range(i..candidates.len());
        candidates.swap(i, j);
    }
    for (i, &entity) in candidates[..picks].iter().enumerate() {
        state.scheduler.after(
            state.now_ms,
            i as u64 * BOMB_STAGGER_MS,
            TimerEvent::ChainKill { entity },
        );
    }
    log::debug!("Bomb power-up targeting {} balls", picks);
}

/// Double kill scores for 10 seconds. Collecting again restarts the window.
pub fn activate_score_boost(state: &mut GameState) {
    let refreshed = match state.powerups.boost_timer.take() {
        Some(timer) => state.scheduler.cancel(timer),
        None => false,
    };
    let timer = state
        .scheduler
        .after(state.now_ms, BOOST_DURATION_MS, TimerEvent::BoostEnd);
    state.powerups.boost_timer = Some(timer);
    state.emit(GameEvent::BoostStarted { refreshed });
}

pub fn end_boost(state: &mut GameState) {
    if state.powerups.boost_timer.take().is_some() {
        state.emit(GameEvent::BoostEnded);
    }
}

/// Tear down: cancel the drop loop and running effects, discard uncollected power-ups
pub fn stop(state: &mut GameState) {
    let controller = std::mem::take(&mut state.powerups);
    let timers = controller
        .spawn_timer
        .into_iter()
        .chain(controller.freeze_timer)
        .chain(controller.boost_timer)
        .chain(controller.active.iter().map(|p| p.expiry_timer));
    for timer in timers {
        state.scheduler.cancel(timer);
    }
    if controller.freeze_timer.is_some() {
        restore_velocities(state);
    }
    // Keep ids unique across the run
    state.powerups.next_id = controller.next_id;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{SIM_DT, SIM_DT_MS};
    use crate::sim::tick::{TickInput, tick};

    fn playing_state(level: usize, balls: usize) -> GameState {
        let mut state = GameState::new(21);
        state.phase = GamePhase::Playing;
        state.level = level;
        for i in 0..balls {
            state.registry.spawn(
                EntityKind::Normal,
                Vec2::new(60.0 + i as f32 * 40.0, 300.0),
                Vec2::new(0.0, 50.0),
            );
        }
        state
    }

    fn advance(state: &mut GameState, ms: u64) {
        for _ in 0..ms / SIM_DT_MS {
            tick(state, &TickInput::default(), SIM_DT);
        }
    }

    #[test]
    fn test_spawn_loop_drops_and_expires() {
        let mut state = playing_state(10, 8);
        arm(&mut state);
        assert!(state.powerups.spawn_armed(&state.scheduler));

        advance(&mut state, SPAWN_DELAY_MAX_MS);
        assert_eq!(state.powerups.active.len(), 1);
        assert!(state.powerups.spawn_armed(&state.scheduler));
        let first = state.powerups.active[0].clone();
        assert!(first.pos.x >= POWERUP_MARGIN && first.pos.x < WORLD_WIDTH - POWERUP_MARGIN);

        assert!(state.drain_events().contains(&GameEvent::PowerUpSpawned {
            id: first.id,
            kind: first.kind,
            pos: first.pos,
            expires_at_ms: first.expires_at_ms,
        }));

        // Gone exactly when the advertised expiry comes due
        let remaining = first.expires_at_ms - state.now_ms;
        advance(&mut state, remaining - SIM_DT_MS);
        assert!(state.powerups.get(first.id).is_some());
        advance(&mut state, SIM_DT_MS);
        assert!(state.powerups.get(first.id).is_none());
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PowerUpExpired { id: first.id }));
    }

    #[test]
    fn test_no_drop_without_live_balls() {
        let mut state = playing_state(10, 0);
        arm(&mut state);
        advance(&mut state, SPAWN_DELAY_MAX_MS);
        assert!(state.powerups.active.is_empty());
        assert!(state.powerups.spawn_armed(&state.scheduler));
    }

    #[test]
    fn test_time_freeze_saves_and_restores() {
        let mut state = playing_state(10, 3);
        assert!(activate_time_freeze(&mut state));
        assert!(state.registry.live().all(|e| e.vel == Vec2::ZERO));
        // Re-entry is ignored and does not extend the freeze
        assert!(!activate_time_freeze(&mut state));

        advance(&mut state, FREEZE_DURATION_MS - SIM_DT_MS);
        assert!(state.powerups.freeze_active());
        advance(&mut state, SIM_DT_MS);
        assert!(!state.powerups.freeze_active());
        assert!(state.registry.live().all(|e| e.saved_vel.is_none()));
        assert!(state.registry.live().all(|e| e.vel.length() > 0.0));
    }

    #[test]
    fn test_bomb_pops_three() {
        let mut state = playing_state(10, 6);
        activate_bomb(&mut state);
        advance(&mut state, 2 * BOMB_STAGGER_MS + SIM_DT_MS);
        assert_eq!(state.registry.live_count(), 3);
        assert!(state.score > 0);
    }

    #[test]
    fn test_bomb_with_fewer_targets() {
        let mut state = playing_state(10, 2);
        activate_bomb(&mut state);
        advance(&mut state, 3 * BOMB_STAGGER_MS);
        assert_eq!(state.registry.live_count(), 0);
    }

    #[test]
    fn test_bomb_powerup_does_not_set_off_bomb_balls() {
        let mut state = playing_state(10, 0);
        let bomb = state
            .registry
            .spawn(EntityKind::Bomb, Vec2::new(100.0, 100.0), Vec2::ZERO);
        state
            .registry
            .spawn(EntityKind::Normal, Vec2::new(150.0, 100.0), Vec2::ZERO);
        state
            .registry
            .spawn(EntityKind::Normal, Vec2::new(100.0, 160.0), Vec2::ZERO);

        activate_bomb(&mut state);
        let queued = |state: &GameState| {
            state
                .scheduler
                .count_pending(|e| matches!(e, TimerEvent::ChainKill { .. }))
        };
        assert_eq!(queued(&state), 3);

        while state.registry.is_alive(bomb) {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        // The bomb ball queued no blast of its own: one kill left per live ball
        assert_eq!(queued(&state), state.registry.live_count());
        let bomb_points = state.drain_events().into_iter().find_map(|e| match e {
            GameEvent::Scored { entity, points, combo } if entity == bomb => Some((points, combo)),
            _ => None,
        });
        let (points, combo) = bomb_points.unwrap();
        assert_eq!(points, 110 * u64::from(combo));

        advance(&mut state, 2 * BOMB_STAGGER_MS);
        assert_eq!(state.registry.live_count(), 0);
        assert_eq!(queued(&state), 0);
        // Three kills at x1 special, combo 1 + 2 + 3
        assert_eq!(state.score, 110 * 6);
    }

    #[test]
    fn test_score_boost_refreshes_without_stacking() {
        let mut state = playing_state(10, 3);
        activate_score_boost(&mut state);
        advance(&mut state, 2000);
        activate_score_boost(&mut state);
        assert!(state.drain_events().contains(&GameEvent::BoostStarted { refreshed: true }));

        // Still running 9s after the refresh
        advance(&mut state, 9000);
        assert!(state.powerups.boost_active());
        // Gone after the flat 10s window, well short of 20s
        advance(&mut state, 1000);
        assert!(!state.powerups.boost_active());
    }

    #[test]
    fn test_collect_removes_and_applies() {
        let mut state = playing_state(10, 3);
        spawn_one(&mut state);
        let id = state.powerups.active[0].id;
        let kind = state.powerups.active[0].kind;
        assert!(collect(&mut state, id));
        assert!(!collect(&mut state, id));
        assert!(state.powerups.active.is_empty());
        assert!(!state
            .scheduler
            .any_pending(|e| *e == TimerEvent::PowerUpExpire { id }));
        match kind {
            PowerUpKind::TimeFreeze => assert!(state.powerups.freeze_active()),
            PowerUpKind::ScoreBoost => assert!(state.powerups.boost_active()),
            PowerUpKind::Bomb => assert!(state
                .scheduler
                .any_pending(|e| matches!(e, TimerEvent::ChainKill { .. }))),
        }
    }

    #[test]
    fn test_stop_discards_without_applying() {
        let mut state = playing_state(10, 3);
        arm(&mut state);
        spawn_one(&mut state);
        activate_time_freeze(&mut state);
        activate_score_boost(&mut state);
        stop(&mut state);

        assert!(state.powerups.active.is_empty());
        assert!(!state.powerups.freeze_active());
        assert!(!state.powerups.boost_active());
        assert!(!state.powerups.spawn_armed(&state.scheduler));
        assert!(state.scheduler.is_empty());
        assert!(state.registry.live().all(|e| e.vel.length() > 0.0));
    }
}
