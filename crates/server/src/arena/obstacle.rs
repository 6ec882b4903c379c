//! Destructible, self-regenerating obstacles.

use crate::collision::Aabb;
use crate::entity::EntityId;
use crate::geometry::Point;
use parking_lot::RwLock;
use protocol::packets::ObstacleView;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a destroyed obstacle stays out of play.
pub const REGENERATION_DELAY: Duration = Duration::from_secs(10);

/// Obstacle shared between the arena map and the simulation tick.
pub type SharedObstacle = Arc<RwLock<Obstacle>>;

/// A square block that absorbs bullets and blocks movement.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: EntityId,
    pub position: Point,
    pub health: i32,
    pub size: f32,
    /// Destroyed obstacles are invulnerable: skipped by collision and hidden by clients.
    pub vulnerable: bool,
    max_health: i32,
    max_size: f32,
    regenerate_at: Option<Instant>,
}

impl Obstacle {
    pub fn new(id: EntityId, position: Point, health: i32, size: f32) -> Self {
        Self {
            id,
            position,
            health,
            size,
            vulnerable: true,
            max_health: health,
            max_size: size,
            regenerate_at: None,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }

    /// Apply bullet damage. Returns true if the obstacle was destroyed by this hit.
    ///
    /// A surviving obstacle shrinks proportionally to the damage relative to its remaining
    /// health; a destroyed one leaves play until [`REGENERATION_DELAY`] has passed.
    pub fn take_damage(&mut self, damage: i32, now: Instant) -> bool {
        self.health -= damage;

        if self.health <= 0 {
            self.vulnerable = false;
            self.regenerate_at = Some(now + REGENERATION_DELAY);
            return true;
        }

        self.size = (self.size - self.size * damage as f32 / self.health as f32 / 2.0).max(0.0);
        false
    }

    /// Restore a destroyed obstacle once its cooldown has elapsed. Returns true on restore.
    pub fn advance(&mut self, now: Instant) -> bool {
        match self.regenerate_at {
            Some(at) if now >= at => {
                self.health = self.max_health;
                self.size = self.max_size;
                self.vulnerable = true;
                self.regenerate_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn view(&self) -> ObstacleView {
        ObstacleView {
            id: self.id,
            position: self.position.into(),
            health: self.health,
            size: self.size,
            vulnerable: self.vulnerable,
        }
    }
}
