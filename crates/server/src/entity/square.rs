//! Square entity: the combat state shared by players and bots.

use super::{Bullet, EntityId};
use crate::collision::Aabb;
use crate::config::{BulletConfig, Config, SquareConfig};
use crate::geometry::{Point, Vector, normalized};
use crate::server::client::Link;
use parking_lot::RwLock;
use protocol::Color;
use protocol::packets::{BULLET_SLOTS, PlayerInput, SquareView};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time between a shot and the next one.
pub const RELOAD_DELAY: Duration = Duration::from_millis(500);

/// How long a respawned square stays invulnerable unless it shoots first.
pub const INVULNERABILITY_WINDOW: Duration = Duration::from_secs(3);

/// Colour change period while invulnerable.
pub const COLOR_CYCLE_INTERVAL: Duration = Duration::from_millis(250);

/// Square shared between the session map, the tick and its connection task.
pub type SharedSquare = Arc<RwLock<Square>>;

/// Post-death sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regeneration {
    Alive,
    /// Invulnerable until `until` or the first shot.
    Regenerating { until: Instant, next_color_at: Instant },
}

/// A player- or bot-controlled square.
#[derive(Debug)]
pub struct Square {
    pub id: EntityId,
    /// Top-left corner.
    pub position: Point,
    /// Where the square (re)spawns. Never changes.
    pub spawn: Point,
    pub health: i32,
    pub speed: f32,
    pub size: f32,
    pub bullets: [Option<Bullet>; BULLET_SLOTS],
    pub kills: u32,
    pub deaths: u32,
    pub vulnerable: bool,
    pub is_bot: bool,
    pub can_shoot: bool,
    pub color: Color,
    /// Outbound channel of a connected player.
    pub link: Option<Link>,
    /// Latest input received since the previous tick.
    pub input: Option<PlayerInput>,
    native_color: Color,
    defaults: SquareConfig,
    weapon: BulletConfig,
    reload_at: Option<Instant>,
    regeneration: Regeneration,
}

impl Square {
    fn new(id: EntityId, spawn: Point, is_bot: bool, config: &Config) -> Self {
        let color = random_bright_color(&mut rand::rng());
        Self {
            id,
            position: spawn,
            spawn,
            health: config.square.health,
            speed: config.square.speed,
            size: config.square.size,
            bullets: Default::default(),
            kills: 0,
            deaths: 0,
            vulnerable: true,
            is_bot,
            can_shoot: is_bot,
            color,
            link: None,
            input: None,
            native_color: color,
            defaults: config.square,
            weapon: config.bullet,
            reload_at: None,
            regeneration: Regeneration::Alive,
        }
    }

    /// A fresh bot standing on `spawn`.
    pub fn bot(id: EntityId, spawn: Point, config: &Config) -> Self {
        Self::new(id, spawn, true, config)
    }

    /// A fresh player standing on `spawn`. It cannot shoot until its first idle input.
    pub fn player(id: EntityId, spawn: Point, config: &Config) -> Self {
        Self::new(id, spawn, false, config)
    }

    #[inline]
    pub fn footprint(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.footprint().center()
    }

    #[inline]
    pub fn regeneration(&self) -> Regeneration {
        self.regeneration
    }

    #[inline]
    pub fn is_regenerating(&self) -> bool {
        matches!(self.regeneration, Regeneration::Regenerating { .. })
    }

    /// Kills minus deaths.
    #[inline]
    pub fn record(&self) -> i64 {
        self.kills as i64 - self.deaths as i64
    }

    #[inline]
    pub fn move_by(&mut self, vector: Vector, dt: f32) {
        self.position += vector * self.speed * dt;
    }

    /// Fire toward `aim`. Returns true if a bullet left the barrel.
    ///
    /// Requires a loaded weapon, a free slot and an aim point distinct from the
    /// square's own position. Firing ends post-death invulnerability at once.
    pub fn shoot(&mut self, aim: Point, now: Instant) -> bool {
        if !self.can_shoot {
            return false;
        }
        let Some(slot) = self.bullets.iter().position(Option::is_none) else {
            return false;
        };
        let direction = normalized(aim - self.position);
        if direction == Vector::ZERO {
            return false;
        }

        let origin = self.position + Vector::splat(self.size / 2.0);
        self.bullets[slot] = Some(Bullet::new(origin, direction, &self.weapon));
        self.can_shoot = false;
        self.reload_at = Some(now + RELOAD_DELAY);

        if self.is_regenerating() {
            self.restore_vulnerability();
        }
        true
    }

    /// Apply a hit. Returns true when the hit was lethal; the caller credits the shooter.
    pub fn take_damage(&mut self, damage: i32, now: Instant) -> bool {
        if !self.vulnerable {
            return false;
        }

        self.health -= damage;
        if self.health <= 0 {
            self.deaths += 1;
            self.begin_regeneration(now);
            return true;
        }

        self.speed -= self.speed / 10.0;
        false
    }

    /// Evaluate the reload and regeneration deadlines.
    pub fn advance_timers(&mut self, now: Instant) {
        if self.reload_at.is_some_and(|at| now >= at) {
            self.reload_at = None;
            self.can_shoot = true;
        }

        if let Regeneration::Regenerating { until, next_color_at } = self.regeneration {
            if now >= until {
                self.restore_vulnerability();
            } else if now >= next_color_at {
                self.color = random_bright_color(&mut rand::rng());
                self.regeneration = Regeneration::Regenerating {
                    until,
                    next_color_at: now + COLOR_CYCLE_INTERVAL,
                };
            }
        }
    }

    fn begin_regeneration(&mut self, now: Instant) {
        self.health = self.defaults.health;
        self.speed = self.defaults.speed;
        self.size = self.defaults.size;
        self.position = self.spawn;
        self.vulnerable = false;
        self.regeneration = Regeneration::Regenerating {
            until: now + INVULNERABILITY_WINDOW,
            next_color_at: now + COLOR_CYCLE_INTERVAL,
        };
    }

    fn restore_vulnerability(&mut self) {
        self.vulnerable = true;
        self.color = self.native_color;
        self.regeneration = Regeneration::Alive;
    }

    pub fn view(&self) -> SquareView {
        SquareView {
            id: self.id,
            position: self.position.into(),
            health: self.health,
            speed: self.speed,
            size: self.size,
            bullets: std::array::from_fn(|i| self.bullets[i].as_ref().map(Bullet::view)),
            kills: self.kills,
            deaths: self.deaths,
            color: self.color,
            is_bot: self.is_bot,
        }
    }
}

/// Random colour whose channel sum exceeds half of the maximum.
pub fn random_bright_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    loop {
        let color = Color::new(rng.random(), rng.random(), rng.random());
        if color.is_bright() {
            return color;
        }
    }
}
