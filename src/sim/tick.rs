//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session deterministically. Per tick:
//! input flags, clock, due timers, taps and pickups, movement, then the
//! level-clear / time-limit check.

use super::boss;
use super::collision::{self, Platform};
use super::levels::{self, Level};
use super::powerup::{self, PowerUpController, PowerUpId};
use super::registry::{EntityId, EntityKind};
use super::scheduler::TimerEvent;
use super::scoring::{self, BOMB_BLAST_RADIUS, KillContext};
use super::spawn;
use super::state::{GameEvent, GamePhase, GameState, SoundCue};

/// Delay between the start tap and the first level
pub const START_DELAY_MS: u64 = 1000;
/// Pause between clearing a level and spawning the next
pub const LEVEL_TRANSITION_DELAY_MS: u64 = 500;
/// Delay before balls caught in a bomb blast pop
pub const BLAST_CHAIN_DELAY_MS: u64 = 120;
/// Levels above this shake the camera on ledge hits
pub const LEDGE_SHAKE_LEVEL: usize = 3;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start tap on the logo
    pub start: bool,
    /// Balls tapped this tick, in order
    pub taps: Vec<EntityId>,
    /// Power-ups tapped this tick
    pub collect: Vec<PowerUpId>,
    /// Restart button
    pub restart: bool,
    /// Mute button
    pub toggle_sound: bool,
    /// Idle/demo mode - AI plays the game
    pub autoplay: bool,
}

/// How a ball died
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillCause {
    /// Player tap
    Tap,
    /// Bomb blast or bomb power-up; never sets off another blast
    Chained,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.toggle_sound {
        state.sound_enabled = !state.sound_enabled;
        log::debug!("Sound {}", if state.sound_enabled { "on" } else { "off" });
    }

    if input.restart {
        restart(state);
    } else if input.start && state.phase == GamePhase::Idle {
        start(state);
    }

    state.now_ms += (dt * 1000.0).round() as u64;

    while let Some((_, event)) = state.scheduler.pop_due(state.now_ms) {
        handle_timer(state, event);
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    if input.autoplay {
        autoplay(state);
    }
    for &id in &input.taps {
        tap(state, id);
    }
    for &id in &input.collect {
        powerup::collect(state, id);
    }

    collision::integrate(&mut state.registry, dt);
    let ledge_hits = collision::resolve_contacts(
        &mut state.registry,
        &state.collision_pairs,
        &Platform::default(),
    );
    if ledge_hits > 0 && state.level > LEDGE_SHAKE_LEVEL {
        state.shake(4.0, 60);
    }

    evaluate_level(state);
}

/// Leave the logo screen and queue the first level
pub fn start(state: &mut GameState) {
    if state.phase != GamePhase::Idle {
        return;
    }
    // Anything left over from before the start tap goes away uncredited
    state.registry.clear();
    state.phase = GamePhase::Playing;
    state.start_ms = state.now_ms;
    state
        .scheduler
        .after(state.now_ms, START_DELAY_MS, TimerEvent::SpawnLevel);
    state.play(SoundCue::Soundtrack);
    log::info!("Game started (seed {})", state.seed);
}

/// Full reset, then straight back into level 0
pub fn restart(state: &mut GameState) {
    powerup::stop(state);
    state.scheduler.cancel_all();
    state.registry.reset();
    // Power-up ids restart with the run so replays line up
    state.powerups = PowerUpController::default();
    state.score = 0;
    state.level = 0;
    state.combo = Default::default();
    state.boss = None;
    state.level_transitioning = false;
    state.reseed();
    state.phase = GamePhase::Playing;
    state.start_ms = state.now_ms;
    state.next_autoplay_ms = state.now_ms;
    state.play(SoundCue::Soundtrack);
    log::info!("Restarting run (seed {})", state.seed);

    match levels::level_params(0) {
        Ok(level) => spawn::spawn_level(state, &level, 0),
        Err(e) => log::error!("Cannot restart: {}", e),
    }
}

fn handle_timer(state: &mut GameState, event: TimerEvent) {
    match event {
        TimerEvent::SpawnLevel => {
            if state.phase != GamePhase::Playing {
                return;
            }
            match levels::level_params(state.level) {
                Ok(level) => spawn::spawn_level(state, &level, state.level),
                Err(e) => log::warn!("No level to spawn: {}", e),
            }
        }
        TimerEvent::ActivateBoss => boss::activate(state),
        TimerEvent::SpawnMinions { pos } => boss::spawn_minions(state, pos),
        TimerEvent::ChainKill { entity } => {
            kill(state, entity, KillCause::Chained);
        }
        TimerEvent::PowerUpSpawn => powerup::on_spawn_timer(state),
        TimerEvent::PowerUpExpire { id } => powerup::expire(state, id),
        TimerEvent::FreezeEnd => powerup::end_freeze(state),
        TimerEvent::BoostEnd => powerup::end_boost(state),
    }
}

/// Route a tap: the boss takes a hit, anything else pops
pub fn tap(state: &mut GameState, id: EntityId) {
    let kind = match state.registry.get(id) {
        Some(e) if e.alive => e.kind,
        _ => return,
    };
    match kind {
        EntityKind::Boss => {
            boss::hit(state, id);
        }
        EntityKind::Normal | EntityKind::Golden | EntityKind::Bomb | EntityKind::Minion => {
            kill(state, id, KillCause::Tap);
        }
    }
}

/// Pop a ball, score it and set off its blast if it is a bomb.
/// Returns the points awarded, or None if nothing died.
pub fn kill(state: &mut GameState, id: EntityId, cause: KillCause) -> Option<u64> {
    let (kind, pos, scale) = match state.registry.get(id) {
        Some(e) if e.alive && e.kind != EntityKind::Boss => (e.kind, e.pos, e.scale),
        _ => return None,
    };
    state.registry.mark_dead(id);
    state.emit(GameEvent::Explosion { pos, scale });
    state.play(SoundCue::Explosion);
    state.shake(4.0, 80);

    let triggered_by_bomb = cause == KillCause::Chained;
    let mut points = 0;
    if state.phase == GamePhase::Playing {
        let ctx = KillContext {
            kind,
            level_index: state.level,
            score_boost_active: state.powerups.boost_active(),
            triggered_by_bomb,
            now_ms: state.now_ms,
        };
        let (awarded, combo) = scoring::on_kill(&ctx, state.combo);
        state.combo = combo;
        state.score += awarded;
        points = awarded;
        state.emit(GameEvent::Scored {
            entity: id,
            points,
            combo: combo.combo_count,
        });
    }

    if scoring::triggers_blast(kind, triggered_by_bomb) {
        let targets: Vec<EntityId> = state
            .registry
            .live()
            .filter(|e| e.kind != EntityKind::Boss && e.pos.distance(pos) <= BOMB_BLAST_RADIUS)
            .map(|e| e.id)
            .collect();
        log::debug!("Bomb {} caught {} balls", id, targets.len());
        for entity in targets {
            state
                .scheduler
                .after(state.now_ms, BLAST_CHAIN_DELAY_MS, TimerEvent::ChainKill { entity });
        }
        state.shake(12.0, 100);
    }

    Some(points)
}

fn level_cleared(state: &GameState, level: &Level) -> bool {
    if level.is_boss {
        boss::is_cleared(state)
    } else {
        state.registry.all_dead(level.ball_count as usize)
    }
}

/// The per-tick clear / timeout decision. A clear on the expiry tick wins.
fn evaluate_level(state: &mut GameState) {
    if state.phase != GamePhase::Playing
        || state.level_transitioning
        || state.registry.is_empty()
    {
        return;
    }
    let level = match levels::level_params(state.level) {
        Ok(level) => level,
        Err(e) => {
            log::warn!("{}", e);
            return;
        }
    };
    let over_time = state.elapsed_ms() > level.time_limit_ms();

    if level_cleared(state, &level) {
        if state.is_final_level() {
            if over_time {
                lose(state);
            } else {
                win(state);
            }
        } else {
            advance_level(state);
        }
    } else if over_time {
        lose(state);
    }
}

fn advance_level(state: &mut GameState) {
    state.level_transitioning = true;
    log::info!(
        "Level {} cleared in {} (score {})",
        state.level,
        state.timer_text(),
        state.score
    );
    state.emit(GameEvent::LevelCleared { level: state.level });
    state.level += 1;
    state.scheduler.after(
        state.now_ms,
        LEVEL_TRANSITION_DELAY_MS,
        TimerEvent::SpawnLevel,
    );
}

fn lose(state: &mut GameState) {
    state.phase = GamePhase::Lost;
    // Out of time: everything left pops without credit
    for entity in state.registry.iter_mut() {
        entity.alive = false;
    }
    powerup::stop(state);
    state.scheduler.cancel_all();
    log::info!("Lost on level {} with score {}", state.level, state.score);
    state.emit(GameEvent::Lost { score: state.score });
    state.play(SoundCue::GameOver);
    state.shake(20.0, 100);
}

fn win(state: &mut GameState) {
    state.phase = GamePhase::Won;
    powerup::stop(state);
    state.scheduler.cancel_all();
    log::info!("Won with score {}", state.score);
    state.emit(GameEvent::Won { score: state.score });
    state.play(SoundCue::Victory);
}

/// Demo AI: tap the oldest live ball on a fixed cadence and grab every power-up
fn autoplay(state: &mut GameState) {
    if state.now_ms < state.next_autoplay_ms {
        return;
    }
    state.next_autoplay_ms = state.now_ms + state.autoplay_interval_ms;

    let pickups: Vec<PowerUpId> = state.powerups.active.iter().map(|p| p.id).collect();
    for id in pickups {
        powerup::collect(state, id);
    }
    let next = state.registry.live().next().map(|e| e.id);
    if let Some(id) = next {
        tap(state, id);
    }
}
