//! Movement, wall bounces and contact resolution
//!
//! Balls move in straight lines, bounce off the field bounds and the ledge,
//! and knock into their spawn-order neighbour. The neighbour pairs are built
//! once per spawn rather than re-registered every frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::registry::{Entity, EntityRegistry};
use crate::consts::*;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at the contact, pointing toward the ball centre
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// The static ledge in the middle of the field
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            center: Vec2::new(PLATFORM_POS.0, PLATFORM_POS.1),
            half_extents: Vec2::new(PLATFORM_HALF_EXTENTS.0, PLATFORM_HALF_EXTENTS.1),
        }
    }
}

/// Slot pairs that are checked for ball-ball contact each tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionPairs {
    pairs: Vec<(usize, usize)>,
}

impl CollisionPairs {
    /// Each slot collides with the slot spawned just before it
    pub fn rebuild(&mut self, slots: usize) {
        self.pairs = (1..slots).map(|i| (i - 1, i)).collect();
    }

    /// Add pairs for slots appended since the last build
    pub fn extend_to(&mut self, slots: usize) {
        let start = self.pairs.last().map(|&(_, b)| b + 1).unwrap_or(1);
        self.pairs.extend((start..slots).map(|i| (i - 1, i)));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Reflect a velocity about a surface normal
pub fn reflect_velocity(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Circle-circle overlap; the normal points from `b` toward `a`
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = a_pos - b_pos;
    let dist = delta.length();
    let min_dist = a_radius + b_radius;
    if dist >= min_dist {
        return CollisionResult::miss();
    }
    let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };
    CollisionResult {
        hit: true,
        normal,
        penetration: min_dist - dist,
    }
}

/// Circle against the platform box
pub fn circle_platform(pos: Vec2, radius: f32, platform: &Platform) -> CollisionResult {
    let min = platform.center - platform.half_extents;
    let max = platform.center + platform.half_extents;
    let closest = pos.clamp(min, max);
    let delta = pos - closest;
    let dist = delta.length();

    if dist > f32::EPSILON {
        if dist >= radius {
            return CollisionResult::miss();
        }
        return CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: radius - dist,
        };
    }

    // Centre inside the box: push out along the shallowest axis
    let to_min = pos - min;
    let to_max = max - pos;
    let candidates = [
        (to_min.x, Vec2::NEG_X),
        (to_max.x, Vec2::X),
        (to_min.y, Vec2::NEG_Y),
        (to_max.y, Vec2::Y),
    ];
    let (depth, normal) = candidates
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::Y));
    CollisionResult {
        hit: true,
        normal,
        penetration: depth + radius,
    }
}

/// Keep a ball inside the field, bouncing off the bounds
pub fn bounce_off_bounds(entity: &mut Entity) {
    let r = entity.radius();
    let (min_x, max_x) = (BOUNDS_MIN + r, BOUNDS_MAX_X - r);
    let (min_y, max_y) = (BOUNDS_MIN + r, BOUNDS_MAX_Y - r);

    if entity.pos.x < min_x {
        entity.pos.x = min_x;
        entity.vel.x = entity.vel.x.abs() * entity.bounce;
    } else if entity.pos.x > max_x {
        entity.pos.x = max_x;
        entity.vel.x = -entity.vel.x.abs() * entity.bounce;
    }
    if entity.pos.y < min_y {
        entity.pos.y = min_y;
        entity.vel.y = entity.vel.y.abs() * entity.bounce;
    } else if entity.pos.y > max_y {
        entity.pos.y = max_y;
        entity.vel.y = -entity.vel.y.abs() * entity.bounce;
    }
}

/// Move every live ball and bounce it off the bounds
pub fn integrate(registry: &mut EntityRegistry, dt: f32) {
    for entity in registry.iter_mut().filter(|e| e.alive) {
        entity.pos += entity.vel * dt;
        bounce_off_bounds(entity);
    }
}

/// Resolve ledge and neighbour contacts. Returns the number of ledge hits.
pub fn resolve_contacts(
    registry: &mut EntityRegistry,
    pairs: &CollisionPairs,
    platform: &Platform,
) -> usize {
    let mut platform_hits = 0;
    for entity in registry.iter_mut().filter(|e| e.alive) {
        let result = circle_platform(entity.pos, entity.radius(), platform);
        if result.hit {
            entity.pos += result.normal * result.penetration;
            if entity.vel.dot(result.normal) < 0.0 {
                entity.vel = reflect_velocity(entity.vel, result.normal) * entity.bounce;
            }
            platform_hits += 1;
        }
    }

    for &(i, j) in pairs.iter() {
        let (a, b) = match (registry.slot(i), registry.slot(j)) {
            (Some(a), Some(b)) => (a.clone(), b.clone()),
            _ => continue,
        };
        // Frozen balls stay put
        if !a.alive || !b.alive || a.saved_vel.is_some() || b.saved_vel.is_some() {
            continue;
        }
        let result = circle_circle(a.pos, a.radius(), b.pos, b.radius());
        if !result.hit {
            continue;
        }

        let n = result.normal;
        let closing = (a.vel - b.vel).dot(n);
        let half = n * (result.penetration / 2.0);
        // Equal-mass elastic exchange along the normal
        let impulse = if closing < 0.0 { n * closing } else { Vec2::ZERO };
        if let Some(a) = registry.slot_mut(i) {
            a.pos += half;
            a.vel -= impulse;
        }
        if let Some(b) = registry.slot_mut(j) {
            b.pos -= half;
            b.vel += impulse;
        }
    }

    platform_hits
}
