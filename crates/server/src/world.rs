//! World state and the per-tick simulation.
//!
//! The world owns the arena and the square population. Locking follows one rule:
//! the coarse square-map lock is taken first, and at most one entity lock is held
//! at any moment while it is. Structural changes (join/leave) take the map lock
//! for writing; the tick and snapshots only read it.

use crate::ai::{self, Contact};
use crate::arena::Arena;
use crate::collision::{self, Aabb};
use crate::config::Config;
use crate::entity::{EntityId, SharedSquare, Square, unique_id};
use crate::geometry::{Vector, normalized};
use crate::server::SessionError;
use crate::server::client::Link;
use parking_lot::{Mutex, RwLock};
use protocol::packets::{PlayerInput, WorldUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The session's single world.
#[derive(Debug)]
pub struct World {
    config: Config,
    arena: Arena,
    squares: RwLock<HashMap<EntityId, SharedSquare>>,
    ricochet: bool,
    last_tick: Mutex<Option<Instant>>,
}

impl World {
    /// Generate the arena from the session settings and fill every spawn with a bot.
    pub fn new(config: Config) -> Self {
        let arena = Arena::create(
            config.session.player_count,
            config.session.obstacle_level,
            &config,
        );
        Self::with_arena(config, arena)
    }

    /// Populate an existing arena with one bot per spawn point.
    pub fn with_arena(config: Config, arena: Arena) -> Self {
        let mut rng = rand::rng();
        let mut squares: HashMap<EntityId, SharedSquare> = HashMap::with_capacity(arena.spawns.len());
        for &spawn in &arena.spawns {
            let id = unique_id(&mut rng, |id| squares.contains_key(&id));
            squares.insert(id, Arc::new(RwLock::new(Square::bot(id, spawn, &config))));
        }
        info!(
            "World ready: {}x{} arena, {} obstacles, {} bots",
            arena.width,
            arena.height,
            arena.obstacle_count(),
            squares.len()
        );

        Self {
            ricochet: config.session.ricochet,
            config,
            arena,
            squares: RwLock::new(squares),
            last_tick: Mutex::new(None),
        }
    }

    #[inline]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn square(&self, id: EntityId) -> Option<SharedSquare> {
        self.squares.read().get(&id).cloned()
    }

    pub fn square_count(&self) -> usize {
        self.squares.read().len()
    }

    /// Number of squares currently controlled by players (connected or reserved).
    pub fn player_count(&self) -> usize {
        self.squares
            .read()
            .values()
            .filter(|s| !s.read().is_bot)
            .count()
    }

    /// Replace the weakest bot with a new player at the bot's spawn.
    ///
    /// Returns `None` when every slot already belongs to a player.
    pub fn swap_in_player(&self) -> Option<SharedSquare> {
        let mut squares = self.squares.write();

        let weakest = ai::weakest_bot(squares.iter().map(|(&id, s)| {
            let s = s.read();
            (id, s.is_bot, s.record())
        }))?;
        let bot = squares.remove(&weakest)?;
        let spawn = bot.read().spawn;

        let id = unique_id(&mut rand::rng(), |id| squares.contains_key(&id) || id == weakest);
        let player = Arc::new(RwLock::new(Square::player(id, spawn, &self.config)));
        squares.insert(id, Arc::clone(&player));

        debug!("Player {} replaced bot {} at {:?}", id, weakest, spawn);
        Some(player)
    }

    /// Hand a player's slot back to a fresh bot at the same spawn.
    ///
    /// Returns the new bot's id, or `None` if `id` is not a player.
    pub fn swap_out_player(&self, id: EntityId) -> Option<EntityId> {
        let mut squares = self.squares.write();
        Self::swap_out_locked(&mut squares, id, &self.config)
    }

    /// Like [`World::swap_out_player`], but only while no connection is attached.
    pub fn reclaim_if_unattached(&self, id: EntityId) -> Option<EntityId> {
        let mut squares = self.squares.write();
        let unattached = squares
            .get(&id)
            .is_some_and(|s| s.read().link.is_none());
        if !unattached {
            return None;
        }
        Self::swap_out_locked(&mut squares, id, &self.config)
    }

    /// Give the player `id` its connection.
    ///
    /// The map stays read-locked while the link is set, so a concurrent reclaim either
    /// removes the square first (and the attach fails) or sees the link and leaves it alone.
    pub fn attach(&self, id: EntityId, link: Link) -> Result<SharedSquare, SessionError> {
        let squares = self.squares.read();
        let square = squares.get(&id).ok_or(SessionError::UnknownPlayer(id))?;
        {
            let mut s = square.write();
            if s.is_bot {
                return Err(SessionError::NotAPlayer(id));
            }
            if s.link.is_some() {
                return Err(SessionError::AlreadyConnected(id));
            }
            s.link = Some(link);
        }
        Ok(Arc::clone(square))
    }

    fn swap_out_locked(
        squares: &mut HashMap<EntityId, SharedSquare>,
        id: EntityId,
        config: &Config,
    ) -> Option<EntityId> {
        if squares.get(&id).is_none_or(|s| s.read().is_bot) {
            return None;
        }
        let player = squares.remove(&id)?;
        let spawn = player.read().spawn;

        let bot_id = unique_id(&mut rand::rng(), |b| squares.contains_key(&b) || b == id);
        squares.insert(bot_id, Arc::new(RwLock::new(Square::bot(bot_id, spawn, config))));
        Some(bot_id)
    }

    /// Links of every connected player, cloned so sends happen without any lock held.
    pub fn player_links(&self) -> Vec<(EntityId, Link)> {
        self.squares
            .read()
            .iter()
            .filter_map(|(&id, s)| s.read().link.clone().map(|link| (id, link)))
            .collect()
    }

    /// Copy of the whole world, each entity locked only while it is copied.
    pub fn snapshot(&self) -> WorldUpdate {
        let squares = self.squares.read();
        WorldUpdate {
            obstacles: self.arena.obstacle_views(),
            squares: squares.iter().map(|(&id, s)| (id, s.read().view())).collect(),
        }
    }

    /// Run one tick at `now`, integrating over the time since the previous tick.
    pub fn tick(&self, now: Instant) {
        let dt = {
            let mut last = self.last_tick.lock();
            let dt = last.map_or(0.0, |prev| now.saturating_duration_since(prev).as_secs_f32());
            *last = Some(now);
            dt
        };
        self.step(dt, now);
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&self, dt: f32, now: Instant) {
        self.arena.advance_obstacles(now);

        let squares = self.squares.read();
        for square in squares.values() {
            square.write().advance_timers(now);
        }

        for (&id, square) in squares.iter() {
            self.drive(square, &squares, dt, now);
            self.resolve_square(id, square, &squares);
            self.advance_bullets(id, square, &squares, dt, now);
        }
    }

    /// Apply bot decisions or the latest player input.
    fn drive(
        &self,
        square: &SharedSquare,
        squares: &HashMap<EntityId, SharedSquare>,
        dt: f32,
        now: Instant,
    ) {
        let me = {
            let s = square.read();
            s.is_bot.then(|| Contact::from(&*s))
        };

        let Some(me) = me else {
            let mut s = square.write();
            if let Some(input) = s.input.take() {
                apply_input(&mut s, input, dt, now);
            }
            return;
        };

        let contacts: Vec<Contact> = squares
            .iter()
            .filter(|&(&id, _)| id != me.id)
            .map(|(_, s)| Contact::from(&*s.read()))
            .collect();
        let (enemy, distance) = ai::find_enemy(&me, contacts, self.arena.diagonal());
        let vector = ai::moving_vector(
            &me,
            enemy.as_ref(),
            distance,
            self.arena.width,
            self.arena.height,
            &mut rand::rng(),
        );
        let aim = ai::shooting_point(enemy.as_ref(), distance);

        let mut s = square.write();
        s.move_by(vector, dt);
        if let Some(aim) = aim {
            s.shoot(aim, now);
        }
    }

    /// Push the square out of what it walked into, then keep it inside the arena.
    fn resolve_square(
        &self,
        id: EntityId,
        square: &SharedSquare,
        squares: &HashMap<EntityId, SharedSquare>,
    ) {
        let mut footprint = square.read().footprint();

        if let Some((_, obstacle)) = self.arena.first_obstacle_hit(&footprint) {
            collision::push_out(&mut footprint, &obstacle);
        }
        if let Some((_, other)) = first_square_hit(squares, id, &footprint) {
            collision::push_out(&mut footprint, &other.read().footprint());
        }
        collision::clamp_to_border(
            &mut footprint.position,
            footprint.size,
            self.arena.width,
            self.arena.height,
        );

        square.write().position = footprint.position;
    }

    /// Move the square's bullets and settle their hits.
    ///
    /// The slot array is copied out so the owner's lock is free while victims are locked.
    fn advance_bullets(
        &self,
        id: EntityId,
        square: &SharedSquare,
        squares: &HashMap<EntityId, SharedSquare>,
        dt: f32,
        now: Instant,
    ) {
        let mut bullets = square.read().bullets.clone();
        if bullets.iter().all(Option::is_none) {
            return;
        }

        let mut kills = 0;
        for slot in bullets.iter_mut() {
            let Some(bullet) = slot.as_mut() else {
                continue;
            };
            bullet.advance(dt);

            if let Some((obstacle_id, obstacle_box)) = self.arena.first_obstacle_hit(&bullet.aabb()) {
                if let Some(obstacle) = self.arena.obstacle(obstacle_id) {
                    if obstacle.write().take_damage(bullet.damage, now) {
                        debug!("Obstacle {} destroyed by {}", obstacle_id, id);
                    }
                }
                if !self.ricochet {
                    *slot = None;
                    continue;
                }
                let mut bounds = bullet.aabb();
                collision::ricochet(&mut bounds, &mut bullet.direction, &obstacle_box);
                bullet.position = bounds.position;
            }

            if let Some((victim_id, victim)) = first_square_hit(squares, id, &bullet.aabb()) {
                if victim.write().take_damage(bullet.damage, now) {
                    kills += 1;
                    debug!("Square {} killed {}", id, victim_id);
                }
                *slot = None;
                continue;
            }

            let mut position = bullet.position;
            if collision::clamp_to_border(&mut position, bullet.size, self.arena.width, self.arena.height) {
                *slot = None;
            }
        }

        let mut s = square.write();
        s.bullets = bullets;
        s.kills += kills;
    }
}

/// Turn one input record into movement and an optional shot.
fn apply_input(square: &mut Square, input: PlayerInput, dt: f32, now: Instant) {
    let mut vector = Vector::ZERO;
    if input.up_key_pressed {
        vector.y -= 1.0;
    }
    if input.down_key_pressed {
        vector.y += 1.0;
    }
    if input.left_key_pressed {
        vector.x -= 1.0;
    }
    if input.right_key_pressed {
        vector.x += 1.0;
    }
    square.move_by(normalized(vector), dt);

    if input.shot {
        square.shoot(input.aim.into(), now);
    } else {
        square.can_shoot = true;
    }
}

/// First vulnerable square other than `exclude` overlapping `target`.
fn first_square_hit<'a>(
    squares: &'a HashMap<EntityId, SharedSquare>,
    exclude: EntityId,
    target: &Aabb,
) -> Option<(EntityId, &'a SharedSquare)> {
    squares.iter().find_map(|(&id, shared)| {
        if id == exclude {
            return None;
        }
        let s = shared.read();
        (s.vulnerable && s.footprint().overlaps(target)).then_some((id, shared))
    })
}
