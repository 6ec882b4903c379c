//! Bullets.

use crate::collision::Aabb;
use crate::config::BulletConfig;
use crate::geometry::{Point, Vector};
use protocol::packets::BulletView;

/// A bullet in flight. Owned by the slot of the square that fired it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub position: Point,
    /// Unit direction.
    pub direction: Vector,
    pub size: f32,
    pub speed: f32,
    pub damage: i32,
}

impl Bullet {
    pub fn new(position: Point, direction: Vector, weapon: &BulletConfig) -> Self {
        Self {
            position,
            direction,
            size: weapon.size,
            speed: weapon.speed,
            damage: weapon.damage,
        }
    }

    /// Move along the direction for `dt` seconds.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.position += self.direction * self.speed * dt;
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }

    pub fn view(&self) -> BulletView {
        BulletView {
            position: self.position.into(),
            vector: self.direction.into(),
            size: self.size,
            speed: self.speed,
            damage: self.damage,
        }
    }
}
