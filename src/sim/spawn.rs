//! Level spawner
//!
//! Early levels burst out of a cluster in the middle of the field; from the
//! edge-spawn level on, balls enter from a random screen edge. Boss levels hand
//! off to the boss encounter instead.

use glam::Vec2;
use rand::Rng;

use super::boss;
use super::levels::Level;
use super::powerup;
use super::registry::EntityKind;
use super::scoring::ComboState;
use super::state::{GameEvent, GameState};
use crate::consts::*;
use crate::{direction, world_center};

/// First level whose balls enter from the screen edges
pub const EDGE_SPAWN_LEVEL: usize = 3;
/// First level that rolls golden/bomb balls
pub const SPECIAL_MIN_LEVEL: usize = 2;
/// First level that rolls bomb balls
pub const BOMB_MIN_LEVEL: usize = 3;
pub const GOLDEN_CHANCE: f32 = 0.10;
pub const BOMB_CHANCE: f32 = 0.08;
/// Spread of the centre cluster
pub const CLUSTER_JITTER: f32 = 30.0;
/// Inset from the screen edge for edge spawns
pub const EDGE_MARGIN: f32 = 20.0;

/// Spawn the balls for a level (or start its boss encounter)
pub fn spawn_level(state: &mut GameState, level: &Level, level_index: usize) {
    state.registry.clear();
    state.level_transitioning = false;
    state.combo = ComboState::default();
    state.boss = None;

    if level.is_boss {
        log::info!("Level {}: boss encounter", level_index);
        boss::enter(state, level_index);
        state.emit(GameEvent::LevelStarted {
            level: level_index,
            boss: true,
        });
        return;
    }

    for _ in 0..level.ball_count {
        let pos = spawn_origin(&mut state.rng, level_index);
        let vel = initial_velocity(&mut state.rng, level.speed_multiplier);
        let kind = roll_kind(&mut state.rng, level_index);
        let bounce: f32 = if level_index > 0 {
            state.rng.random_range(0.7..0.9)
        } else {
            1.0
        };
        let id = state.registry.spawn(kind, pos, vel);
        if let Some(entity) = state.registry.get_mut(id) {
            entity.bounce = bounce;
        }
    }

    let specials = state
        .registry
        .iter()
        .filter(|e| e.kind != EntityKind::Normal)
        .count();
    log::info!(
        "Level {}: {} balls ({} special), speed x{:.2}, limit {}s",
        level_index,
        level.ball_count,
        specials,
        level.speed_multiplier,
        level.time_limit_secs
    );

    state.collision_pairs.rebuild(state.registry.len());
    if level_index >= powerup::POWERUP_MIN_LEVEL {
        powerup::arm(state);
    }
    state.emit(GameEvent::LevelStarted {
        level: level_index,
        boss: false,
    });
}

/// Where a ball starts
pub fn spawn_origin(rng: &mut impl Rng, level_index: usize) -> Vec2 {
    if level_index < EDGE_SPAWN_LEVEL {
        let jitter = Vec2::new(
            rng.random::<f32>() * CLUSTER_JITTER,
            rng.random::<f32>() * CLUSTER_JITTER,
        );
        return world_center() + jitter;
    }

    match rng.random_range(0..4u32) {
        0 => Vec2::new(rng.random_range(0.0..WORLD_WIDTH), EDGE_MARGIN),
        1 => Vec2::new(rng.random_range(0.0..WORLD_WIDTH), WORLD_HEIGHT - EDGE_MARGIN),
        2 => Vec2::new(EDGE_MARGIN, rng.random_range(0.0..WORLD_HEIGHT)),
        _ => Vec2::new(WORLD_WIDTH - EDGE_MARGIN, rng.random_range(0.0..WORLD_HEIGHT)),
    }
}

/// Random heading at the level's speed plus a per-ball jitter
pub fn initial_velocity(rng: &mut impl Rng, speed_multiplier: f32) -> Vec2 {
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    let jitter_span = (2 + rng.random_range(0..10u32)) as f32;
    let jitter = rng.random::<f32>() * jitter_span;
    direction(theta) * (BALL_SPEED * speed_multiplier + jitter)
}

/// Decide whether a ball is normal, golden or a bomb
pub fn roll_kind(rng: &mut impl Rng, level_index: usize) -> EntityKind {
    if level_index < SPECIAL_MIN_LEVEL {
        return EntityKind::Normal;
    }
    let r: f32 = rng.random();
    if r < GOLDEN_CHANCE {
        EntityKind::Golden
    } else if r < GOLDEN_CHANCE + BOMB_CHANCE && level_index >= BOMB_MIN_LEVEL {
        EntityKind::Bomb
    } else {
        EntityKind::Normal
    }
}
