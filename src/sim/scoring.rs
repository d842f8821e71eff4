//! Combo and score engine
//!
//! Points for a kill are `base × special × boost × combo`, where the combo
//! multiplier is the chain length capped at 10.

use serde::{Deserialize, Serialize};

use super::registry::EntityKind;

/// Kills closer together than this extend the combo
pub const COMBO_WINDOW_MS: u64 = 1500;
/// Combo multiplier cap
pub const MAX_COMBO_MULTIPLIER: u32 = 10;
pub const GOLDEN_MULTIPLIER: u64 = 5;
pub const BOMB_MULTIPLIER: u64 = 2;
pub const SCORE_BOOST_MULTIPLIER: u64 = 2;
/// Blast radius of a bomb-kind ball
pub const BOMB_BLAST_RADIUS: f32 = 150.0;

/// Boss hits and defeat bonuses
pub const BOSS_HIT_BASE: u64 = 50;
pub const BOSS_DEFEAT_BASE: u64 = 500;
pub const BOSS_DEFEAT_PER_INDEX: u64 = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboState {
    pub combo_count: u32,
    pub last_kill_ms: u64,
}

impl ComboState {
    /// Apply a kill at `now_ms` and return the new state
    pub fn register_kill(self, now_ms: u64) -> Self {
        let combo_count = if now_ms.saturating_sub(self.last_kill_ms) < COMBO_WINDOW_MS {
            self.combo_count + 1
        } else {
            1
        };
        Self {
            combo_count,
            last_kill_ms: now_ms,
        }
    }

    pub fn multiplier(&self) -> u32 {
        self.combo_count.clamp(1, MAX_COMBO_MULTIPLIER)
    }
}

/// Everything about a kill that affects its score
#[derive(Debug, Clone, Copy)]
pub struct KillContext {
    pub kind: EntityKind,
    pub level_index: usize,
    pub score_boost_active: bool,
    /// Killed by a blast or the bomb power-up; such kills never chain further
    pub triggered_by_bomb: bool,
    pub now_ms: u64,
}

/// Base points for any kill on a level
pub fn base_points(level_index: usize) -> u64 {
    10 + level_index as u64 * 10
}

/// Special-ball multiplier. Only a bomb that sets off its own blast doubles.
pub fn special_multiplier(kind: EntityKind, triggered_by_bomb: bool) -> u64 {
    match kind {
        EntityKind::Golden => GOLDEN_MULTIPLIER,
        EntityKind::Bomb if !triggered_by_bomb => BOMB_MULTIPLIER,
        EntityKind::Bomb | EntityKind::Normal | EntityKind::Minion | EntityKind::Boss => 1,
    }
}

/// Whether this kill sets off a blast
pub fn triggers_blast(kind: EntityKind, triggered_by_bomb: bool) -> bool {
    kind == EntityKind::Bomb && !triggered_by_bomb
}

/// Score one kill, returning points and the updated combo
pub fn on_kill(ctx: &KillContext, combo: ComboState) -> (u64, ComboState) {
    let combo = combo.register_kill(ctx.now_ms);
    let boost = if ctx.score_boost_active {
        SCORE_BOOST_MULTIPLIER
    } else {
        1
    };
    let points = base_points(ctx.level_index)
        * special_multiplier(ctx.kind, ctx.triggered_by_bomb)
        * boost
        * u64::from(combo.multiplier());
    (points, combo)
}

/// Flat award for each boss hit
pub fn boss_hit_points(level_index: usize) -> u64 {
    BOSS_HIT_BASE + level_index as u64 * 10
}

/// Bonus for defeating the boss at `boss_index` in the boss set
pub fn boss_defeat_bonus(boss_index: usize) -> u64 {
    BOSS_DEFEAT_BASE + boss_index as u64 * BOSS_DEFEAT_PER_INDEX
}
