//! Boss encounter
//!
//! Boss levels skip the normal spawn. A warning banner runs first, then a
//! single oversized boss enters. Each tap is a hit: it costs the boss one
//! health, speeds it up and releases two minions. The level counts as cleared
//! once the boss is down and every minion is popped.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::levels::{self, Level};
use super::powerup;
use super::registry::{EntityId, EntityKind};
use super::scheduler::TimerEvent;
use super::scoring::{boss_defeat_bonus, boss_hit_points};
use super::state::{GameEvent, GamePhase, GameState, SoundCue};
use crate::consts::BALL_SPEED;
use crate::{direction, world_center};

/// Length of the warning banner before the boss enters
pub const BOSS_WARNING_MS: u64 = 2000;
pub const BOSS_SCALE: f32 = 2.5;
pub const BOSS_SPEED_FACTOR: f32 = 1.25;
/// Speed-up applied on every hit
pub const BOSS_HIT_SPEEDUP: f32 = 1.1;
pub const MINIONS_PER_HIT: u32 = 2;
pub const MINION_SCALE: f32 = 0.6;
/// Delay between a hit and its minions appearing
pub const MINION_SPAWN_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    Warning,
    Active,
    Defeated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossState {
    /// Position of this level in the boss set
    pub boss_index: usize,
    pub level_index: usize,
    pub health: u32,
    pub max_health: u32,
    pub phase: BossPhase,
    /// The boss entity once active
    pub entity: Option<EntityId>,
}

impl BossState {
    pub fn new(boss_index: usize, level_index: usize) -> Self {
        let max_health = 5 + boss_index as u32 * 2;
        Self {
            boss_index,
            level_index,
            health: max_health,
            max_health,
            phase: BossPhase::Warning,
            entity: None,
        }
    }
}

/// Start the encounter in its warning phase
pub fn enter(state: &mut GameState, level_index: usize) {
    let boss_index = levels::boss_index(level_index).unwrap_or_default();
    let boss = BossState::new(boss_index, level_index);
    log::info!(
        "Boss {} incoming on level {} ({} hp)",
        boss_index,
        level_index,
        boss.max_health
    );
    state.boss = Some(boss);
    state
        .scheduler
        .after(state.now_ms, BOSS_WARNING_MS, TimerEvent::ActivateBoss);
    state.emit(GameEvent::BossWarning { boss_index });
    state.play(SoundCue::BossWarning);
}

/// Warning is over: bring in the boss
pub fn activate(state: &mut GameState) {
    let level_index = match state.boss.as_ref() {
        Some(boss) if boss.phase == BossPhase::Warning => boss.level_index,
        _ => return,
    };
    if state.phase != GamePhase::Playing {
        return;
    }
    let speed_multiplier = level_speed(level_index);

    let theta = state.rng.random_range(0.0..std::f32::consts::TAU);
    let vel = direction(theta) * BALL_SPEED * speed_multiplier * BOSS_SPEED_FACTOR;
    let id = state
        .registry
        .spawn_scaled(EntityKind::Boss, world_center(), vel, BOSS_SCALE);

    let max_health = match state.boss.as_mut() {
        Some(boss) => {
            boss.phase = BossPhase::Active;
            boss.entity = Some(id);
            boss.max_health
        }
        None => return,
    };

    state.collision_pairs.rebuild(state.registry.len());
    if level_index >= powerup::POWERUP_MIN_LEVEL {
        powerup::arm(state);
    }
    state.emit(GameEvent::BossActivated {
        entity: id,
        max_health,
    });
}

/// Register a tap on the boss. Returns false if the boss could not be hit.
pub fn hit(state: &mut GameState, entity: EntityId) -> bool {
    let (level_index, health, max_health) = match state.boss.as_mut() {
        Some(boss) if boss.phase == BossPhase::Active && boss.entity == Some(entity) => {
            boss.health = boss.health.saturating_sub(1);
            (boss.level_index, boss.health, boss.max_health)
        }
        _ => return false,
    };

    let points = if state.phase == GamePhase::Playing {
        boss_hit_points(level_index)
    } else {
        0
    };
    state.score += points;
    state.emit(GameEvent::BossHit {
        health,
        max_health,
        points,
    });

    let pos = match state.registry.get_mut(entity) {
        Some(e) => {
            e.boost_speed(BOSS_HIT_SPEEDUP);
            e.pos
        }
        None => world_center(),
    };
    state
        .scheduler
        .after(state.now_ms, MINION_SPAWN_DELAY_MS, TimerEvent::SpawnMinions { pos });
    state.shake(6.0, 80);
    log::debug!("Boss hit: {}/{}", health, max_health);

    if health == 0 {
        defeat(state);
    }
    true
}

fn defeat(state: &mut GameState) {
    let (boss_index, entity) = match state.boss.as_mut() {
        Some(boss) if boss.phase == BossPhase::Active => {
            boss.phase = BossPhase::Defeated;
            (boss.boss_index, boss.entity)
        }
        _ => return,
    };

    let mut explosion_at = None;
    if let Some(id) = entity {
        if state.registry.mark_dead(id) {
            explosion_at = state.registry.get(id).map(|e| e.pos);
        }
    }

    let bonus = if state.phase == GamePhase::Playing {
        boss_defeat_bonus(boss_index)
    } else {
        0
    };
    state.score += bonus;
    log::info!("Boss {} defeated, bonus {}", boss_index, bonus);

    if let Some(pos) = explosion_at {
        state.emit(GameEvent::Explosion {
            pos,
            scale: BOSS_SCALE,
        });
    }
    state.emit(GameEvent::BossDefeated { boss_index, bonus });
    state.play(SoundCue::Explosion);
    state.shake(20.0, 100);
}

/// Release minions at the spot where the boss was hit
pub fn spawn_minions(state: &mut GameState, pos: Vec2) {
    if state.phase != GamePhase::Playing {
        return;
    }
    let Some(level_index) = state.boss.as_ref().map(|b| b.level_index) else {
        return;
    };
    let speed = BALL_SPEED * level_speed(level_index);
    for _ in 0..MINIONS_PER_HIT {
        let theta = state.rng.random_range(0.0..std::f32::consts::TAU);
        state
            .registry
            .spawn_scaled(EntityKind::Minion, pos, direction(theta) * speed, MINION_SCALE);
    }
    state.collision_pairs.extend_to(state.registry.len());
}

/// Boss down, every minion popped and none still on the way
pub fn is_cleared(state: &GameState) -> bool {
    let defeated = state
        .boss
        .as_ref()
        .is_some_and(|b| b.phase == BossPhase::Defeated);
    defeated
        && state.registry.all_dead(state.registry.len())
        && !state
            .scheduler
            .any_pending(|e| matches!(e, TimerEvent::SpawnMinions { .. }))
}

fn level_speed(level_index: usize) -> f32 {
    levels::level_params(level_index)
        .map(|l: Level| l.speed_multiplier)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tick::{TickInput, tick};
    use crate::consts::SIM_DT;

    fn boss_state(level_index: usize) -> GameState {
        let mut state = GameState::new(11);
        state.phase = GamePhase::Playing;
        state.level = level_index;
        enter(&mut state, level_index);
        state
    }

    fn advance(state: &mut GameState, ms: u64) {
        for _ in 0..ms / crate::consts::SIM_DT_MS {
            tick(state, &TickInput::default(), SIM_DT);
        }
    }

    #[test]
    fn test_max_health_scales_with_index() {
        assert_eq!(BossState::new(0, 3).max_health, 5);
        assert_eq!(BossState::new(1, 7).max_health, 7);
        assert_eq!(BossState::new(2, 11).max_health, 9);
    }

    #[test]
    fn test_warning_then_active() {
        let mut state = boss_state(3);
        assert_eq!(state.boss.as_ref().unwrap().phase, BossPhase::Warning);
        assert!(state.registry.is_empty());

        advance(&mut state, BOSS_WARNING_MS);
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.phase, BossPhase::Active);
        let entity = state.registry.get(boss.entity.unwrap()).unwrap();
        assert_eq!(entity.kind, EntityKind::Boss);
        assert_eq!(entity.scale, BOSS_SCALE);
    }

    #[test]
    fn test_hit_before_active_is_noop() {
        let mut state = boss_state(3);
        assert!(!hit(&mut state, 1));
        assert_eq!(state.boss.as_ref().unwrap().health, 5);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_five_hits_defeat_first_boss() {
        let mut state = boss_state(3);
        advance(&mut state, BOSS_WARNING_MS);
        let id = state.boss.as_ref().unwrap().entity.unwrap();
        let start_speed = state.registry.get(id).unwrap().vel.length();

        let mut last_health = 5;
        for _ in 0..5 {
            assert!(hit(&mut state, id));
            let health = state.boss.as_ref().unwrap().health;
            assert!(health < last_health);
            last_health = health;
        }
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.health, 0);
        assert_eq!(boss.phase, BossPhase::Defeated);
        assert!(!state.registry.is_alive(id));
        assert_eq!(state.score, 5 * boss_hit_points(3) + 500);

        let end_speed = state.registry.get(id).unwrap().vel.length();
        assert!((end_speed / start_speed - BOSS_HIT_SPEEDUP.powi(5)).abs() < 1e-3);

        // A sixth hit on a defeated boss changes nothing
        assert!(!hit(&mut state, id));
        let defeats = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BossDefeated { .. }))
            .count();
        assert_eq!(defeats, 1);
    }

    #[test]
    fn test_minions_spawn_and_block_clear() {
        let mut state = boss_state(3);
        advance(&mut state, BOSS_WARNING_MS);
        let id = state.boss.as_ref().unwrap().entity.unwrap();
        for _ in 0..5 {
            hit(&mut state, id);
        }
        // Defeated, but minions are still pending
        assert!(!is_cleared(&state));

        spawn_minions(&mut state, Vec2::new(100.0, 100.0));
        let minions: Vec<_> = state
            .registry
            .live()
            .filter(|e| e.kind == EntityKind::Minion)
            .map(|e| e.id)
            .collect();
        assert_eq!(minions.len(), 2);
        state
            .scheduler
            .cancel_where(|e| matches!(e, TimerEvent::SpawnMinions { .. }));
        assert!(!is_cleared(&state));

        for m in minions {
            state.registry.mark_dead(m);
        }
        assert!(is_cleared(&state));
    }
}
