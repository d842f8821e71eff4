//! Entity registry
//!
//! Entities live in spawn-order slots. Slot order is what the level-clear check
//! walks, so it is never compacted while a level is running; dead entities stay
//! in their slot until the next `clear`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::BALL_RADIUS;

/// Stable identifier for an entity (unique for the whole run)
pub type EntityId = u32;

/// What kind of ball an entity is. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Normal,
    Golden,
    Bomb,
    Minion,
    Boss,
}

/// A tappable ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub alive: bool,
    pub scale: f32,
    /// Restitution against walls and the platform (1.0 = perfectly elastic)
    pub bounce: f32,
    /// Velocity stashed while a time freeze is running
    #[serde(default)]
    pub saved_vel: Option<Vec2>,
}

impl Entity {
    pub fn radius(&self) -> f32 {
        BALL_RADIUS * self.scale
    }

    /// Multiply speed, including any velocity stashed by a freeze
    pub fn boost_speed(&mut self, factor: f32) {
        self.vel *= factor;
        if let Some(saved) = self.saved_vel.as_mut() {
            *saved *= factor;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Register a new entity at unit scale
    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2, vel: Vec2) -> EntityId {
        self.spawn_scaled(kind, pos, vel, 1.0)
    }

    pub fn spawn_scaled(&mut self, kind: EntityKind, pos: Vec2, vel: Vec2, scale: f32) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            kind,
            pos,
            vel,
            alive: true,
            scale,
            bounce: 1.0,
            saved_vel: None,
        });
        id
    }

    /// Mark an entity dead. Returns true only on the alive -> dead transition.
    pub fn mark_dead(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(entity) if entity.alive => {
                entity.alive = false;
                true
            }
            _ => false,
        }
    }

    /// True iff every slot in `[0, count)` is dead or not yet populated
    pub fn all_dead(&self, count: usize) -> bool {
        (0..count).all(|slot| self.entities.get(slot).is_none_or(|e| !e.alive))
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Restart numbering as well as emptying slots
    pub fn reset(&mut self) {
        self.entities.clear();
        self.next_id = 1;
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| e.alive)
    }

    /// Entity in a given slot (spawn order)
    pub fn slot(&self, slot: usize) -> Option<&Entity> {
        self.entities.get(slot)
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut Entity> {
        self.entities.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn live(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.alive)
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    /// Number of populated slots, dead or alive
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
