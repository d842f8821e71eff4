//! Delayed callbacks on the simulation clock
//!
//! Every piece of deferred gameplay (level spawns, bomb chains, power-up
//! expiry, boss warnings) is a `TimerEvent` queued here. Handles are
//! cancellable, and the session cancels all of them on restart.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::powerup::PowerUpId;
use super::registry::EntityId;

pub type TimerId = u64;

/// Work to run when a timer comes due
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Spawn the current level (start delay or level advance)
    SpawnLevel,
    /// End of the boss warning banner
    ActivateBoss,
    /// Minions released by a boss hit
    SpawnMinions { pos: Vec2 },
    /// Deferred kill from a bomb blast or the bomb power-up
    ChainKill { entity: EntityId },
    /// Next power-up drop
    PowerUpSpawn,
    /// Uncollected power-up times out
    PowerUpExpire { id: PowerUpId },
    /// Time freeze wears off
    FreezeEnd,
    /// Score boost wears off
    BoostEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled {
    id: TimerId,
    due_ms: u64,
    event: TimerEvent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    next_id: TimerId,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` to fire once `delay_ms` after `now_ms`
    pub fn after(&mut self, now_ms: u64, delay_ms: u64, event: TimerEvent) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        self.pending.push(Scheduled {
            id,
            due_ms: now_ms + delay_ms,
            event,
        });
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    /// Cancel every pending timer matching `pred`
    pub fn cancel_where(&mut self, pred: impl Fn(&TimerEvent) -> bool) {
        self.pending.retain(|s| !pred(&s.event));
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|s| s.id == id)
    }

    pub fn any_pending(&self, pred: impl Fn(&TimerEvent) -> bool) -> bool {
        self.pending.iter().any(|s| pred(&s.event))
    }

    pub fn count_pending(&self, pred: impl Fn(&TimerEvent) -> bool) -> usize {
        self.pending.iter().filter(|s| pred(&s.event)).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest due timer, if any. Ties break on
    /// scheduling order so firing is deterministic.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, TimerEvent)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= now_ms)
            .min_by_key(|(_, s)| (s.due_ms, s.id))
            .map(|(i, _)| i)?;
        let scheduled = self.pending.swap_remove(idx);
        Some((scheduled.id, scheduled.event))
    }
}
