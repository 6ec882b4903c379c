//! Arena: bounded play area with obstacles and spawn points.
//!
//! The arena is generated once when the session starts. Its obstacle set and spawn list
//! never change afterwards; individual obstacles take damage and regenerate under their
//! own locks.

mod obstacle;
mod spawn;

pub use obstacle::{Obstacle, REGENERATION_DELAY, SharedObstacle};
pub use spawn::generate_spawns;

use crate::collision::Aabb;
use crate::config::Config;
use crate::entity::{EntityId, unique_id};
use crate::geometry::Point;
use parking_lot::RwLock;
use protocol::packets::{ArenaView, ObstacleView};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Squares per arena "unit": larger sessions scale the arena by `player_count / 4`.
const SQUARES_PER_SCALE_UNIT: f32 = 4.0;

/// Placement attempts allowed per requested obstacle before generation gives up.
const PLACEMENT_ATTEMPTS_PER_OBSTACLE: usize = 1_000;

/// Obstacle density chosen for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObstacleLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ObstacleLevel {
    /// Obstacle count for a base-size (four player) arena.
    pub const fn base_count(self) -> usize {
        match self {
            ObstacleLevel::Low => 4,
            ObstacleLevel::Medium => 8,
            ObstacleLevel::High => 12,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ObstacleLevel::Low => "low",
            ObstacleLevel::Medium => "medium",
            ObstacleLevel::High => "high",
        }
    }
}

impl From<&str> for ObstacleLevel {
    /// Unknown levels fall back to medium density.
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => ObstacleLevel::Low,
            "high" => ObstacleLevel::High,
            "medium" => ObstacleLevel::Medium,
            other => {
                warn!("Unknown obstacle level {:?}, using medium", other);
                ObstacleLevel::Medium
            }
        }
    }
}

impl From<String> for ObstacleLevel {
    fn from(name: String) -> Self {
        ObstacleLevel::from(name.as_str())
    }
}

impl From<ObstacleLevel> for String {
    fn from(level: ObstacleLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Arena scale multiplier for a given capacity (never below 1).
#[inline]
pub fn scale_factor(player_count: usize) -> f32 {
    (player_count as f32 / SQUARES_PER_SCALE_UNIT).max(1.0)
}

/// The play area.
#[derive(Debug)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Number of squares the arena was built for.
    pub square_count: usize,
    /// Obstacle count the generator aimed for.
    pub obstacle_target: usize,
    /// One spawn per square, in slot order.
    pub spawns: Vec<Point>,
    obstacles: RwLock<HashMap<EntityId, SharedObstacle>>,
}

impl Arena {
    /// Generate an arena for `player_count` squares using the thread-local RNG.
    pub fn create(player_count: usize, level: ObstacleLevel, config: &Config) -> Self {
        Self::create_with_rng(player_count, level, config, &mut rand::rng())
    }

    /// Generate an arena from an explicit RNG (seeded in tests).
    pub fn create_with_rng<R: Rng + ?Sized>(
        player_count: usize,
        level: ObstacleLevel,
        config: &Config,
        rng: &mut R,
    ) -> Self {
        let mut width = config.arena.width;
        let mut height = config.arena.height;
        let mut obstacle_target = level.base_count();

        let k = player_count as f32 / SQUARES_PER_SCALE_UNIT;
        if k > 1.0 {
            width *= k;
            height *= k;
            obstacle_target *= k as usize;
        }

        let obstacles = place_obstacles(width, height, obstacle_target, config, rng);
        if obstacles.len() < obstacle_target {
            warn!(
                "Placed only {}/{} obstacles in a {}x{} arena",
                obstacles.len(),
                obstacle_target,
                width,
                height
            );
        }
        debug!(
            "Arena {}x{} with {} obstacles for {} squares",
            width,
            height,
            obstacles.len(),
            player_count
        );

        let mut arena = Self::with_layout(
            width,
            height,
            generate_spawns(width, height, player_count),
            obstacles,
        );
        arena.square_count = player_count;
        arena.obstacle_target = obstacle_target;
        arena
    }

    /// Build an arena from an explicit layout.
    pub fn with_layout(
        width: f32,
        height: f32,
        spawns: Vec<Point>,
        obstacles: Vec<Obstacle>,
    ) -> Self {
        let obstacle_target = obstacles.len();
        let obstacles = obstacles
            .into_iter()
            .map(|o| (o.id, Arc::new(RwLock::new(o))))
            .collect();
        Self {
            width,
            height,
            square_count: spawns.len(),
            obstacle_target,
            spawns,
            obstacles: RwLock::new(obstacles),
        }
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Length of the arena diagonal; no two points inside are further apart.
    #[inline]
    pub fn diagonal(&self) -> f32 {
        self.width.hypot(self.height)
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.read().len()
    }

    pub fn obstacle(&self, id: EntityId) -> Option<SharedObstacle> {
        self.obstacles.read().get(&id).cloned()
    }

    /// First vulnerable obstacle overlapping `target`.
    pub fn first_obstacle_hit(&self, target: &Aabb) -> Option<(EntityId, Aabb)> {
        let obstacles = self.obstacles.read();
        obstacles.values().find_map(|shared| {
            let obstacle = shared.read();
            let bounds = obstacle.aabb();
            (obstacle.vulnerable && target.overlaps(&bounds)).then_some((obstacle.id, bounds))
        })
    }

    /// Bring destroyed obstacles back once their cooldown has elapsed.
    pub fn advance_obstacles(&self, now: Instant) {
        for shared in self.obstacles.read().values() {
            let mut obstacle = shared.write();
            if obstacle.advance(now) {
                debug!("Obstacle {} regenerated", obstacle.id);
            }
        }
    }

    /// Copy of every obstacle's state, each lock held only while copying.
    pub fn obstacle_views(&self) -> BTreeMap<EntityId, ObstacleView> {
        self.obstacles
            .read()
            .iter()
            .map(|(&id, shared)| (id, shared.read().view()))
            .collect()
    }

    /// Full layout sent to joining players.
    pub fn view(&self) -> ArenaView {
        ArenaView {
            width: self.width,
            height: self.height,
            obstacles: self.obstacle_views(),
            spawns: self.spawns.iter().map(|&p| p.into()).collect(),
        }
    }
}

/// Rejection-sample obstacle positions inside the inner 80% of the arena.
fn place_obstacles<R: Rng + ?Sized>(
    width: f32,
    height: f32,
    target: usize,
    config: &Config,
    rng: &mut R,
) -> Vec<Obstacle> {
    let size = config.obstacle.size;
    let player_size = config.square.size;
    let center = Point::new(width / 2.0, height / 2.0);
    let exclusion = Aabb::new(center - Point::splat(player_size), player_size * 2.0);

    let mut placed: Vec<Obstacle> = Vec::with_capacity(target);
    let mut attempts = target * PLACEMENT_ATTEMPTS_PER_OBSTACLE;

    while placed.len() < target && attempts > 0 {
        attempts -= 1;

        let position = Point::new(
            rng.random_range(0.1 * width..0.9 * width),
            rng.random_range(0.1 * height..0.9 * height),
        );

        if Aabb::new(position, size).overlaps(&exclusion) {
            continue;
        }
        let crowded = placed.iter().any(|o| {
            (position.x - o.position.x).abs() < size * 2.0
                && (position.y - o.position.y).abs() < size * 2.0
        });
        if crowded {
            continue;
        }

        let id = unique_id(rng, |id| placed.iter().any(|o| o.id == id));
        placed.push(Obstacle::new(id, position, config.obstacle.health, size));
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn arena(seed: u64, players: usize, level: ObstacleLevel) -> Arena {
        let mut rng = StdRng::seed_from_u64(seed);
        Arena::create_with_rng(players, level, &Config::default(), &mut rng)
    }

    #[test]
    fn test_density_levels() {
        assert_eq!(arena(1, 4, ObstacleLevel::Low).obstacle_count(), 4);
        assert_eq!(arena(1, 4, ObstacleLevel::Medium).obstacle_count(), 8);
        assert_eq!(arena(1, 4, ObstacleLevel::High).obstacle_count(), 12);
    }

    #[test]
    fn test_scaling_by_player_count() {
        let small = arena(2, 4, ObstacleLevel::Medium);
        assert_eq!((small.width, small.height), (1280.0, 720.0));

        let big = arena(2, 8, ObstacleLevel::Medium);
        assert_eq!((big.width, big.height), (2560.0, 1440.0));
        assert_eq!(big.obstacle_target, 16);
        assert_eq!(big.spawns.len(), 8);

        // Non-integral multiplier: dimensions scale by 1.5, obstacle count by trunc(1.5).
        let odd = arena(2, 6, ObstacleLevel::Low);
        assert_eq!(odd.width, 1920.0);
        assert_eq!(odd.obstacle_target, 4);
        assert_eq!(scale_factor(2), 1.0);
    }

    #[test]
    fn test_obstacles_never_overlap() {
        for seed in 0..20 {
            let arena = arena(seed, 12, ObstacleLevel::High);
            let views: Vec<_> = arena.obstacle_views().into_values().collect();
            for (i, a) in views.iter().enumerate() {
                for b in &views[i + 1..] {
                    let a_box = Aabb::new(a.position.into(), a.size);
                    let b_box = Aabb::new(b.position.into(), b.size);
                    let dx = (a.position.x - b.position.x).abs();
                    let dy = (a.position.y - b.position.y).abs();
                    assert!(dx >= a.size * 2.0 || dy >= a.size * 2.0);
                    assert!(!a_box.overlaps(&b_box), "seed {seed}: {a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_center_is_kept_clear() {
        let config = Config::default();
        for seed in 0..20 {
            let arena = arena(seed, 4, ObstacleLevel::High);
            let ps = config.square.size;
            let exclusion = Aabb::new(arena.center() - Point::splat(ps), ps * 2.0);
            for o in arena.obstacle_views().values() {
                assert!(!Aabb::new(o.position.into(), o.size).overlaps(&exclusion));
            }
        }
    }

    #[test]
    fn test_obstacles_inside_inner_area() {
        let arena = arena(7, 4, ObstacleLevel::Medium);
        for o in arena.obstacle_views().values() {
            assert!(o.position.x >= 0.1 * arena.width && o.position.x < 0.9 * arena.width);
            assert!(o.position.y >= 0.1 * arena.height && o.position.y < 0.9 * arena.height);
            assert!(o.vulnerable);
            assert_eq!(o.health, 100);
        }
    }

    #[test]
    fn test_tiny_arena_terminates() {
        let mut config = Config::default();
        config.arena.width = 120.0;
        config.arena.height = 120.0;
        let mut rng = StdRng::seed_from_u64(3);
        let arena = Arena::create_with_rng(4, ObstacleLevel::High, &config, &mut rng);
        assert!(arena.obstacle_count() < 12);
        assert_eq!(arena.obstacle_target, 12);
    }

    #[test]
    fn test_view_matches_arena() {
        let arena = arena(5, 4, ObstacleLevel::Low);
        let view = arena.view();
        assert_eq!(view.width, arena.width);
        assert_eq!(view.spawns.len(), 4);
        assert_eq!(view.obstacles.len(), arena.obstacle_count());
        for (id, o) in &view.obstacles {
            assert_eq!(*id, o.id);
            assert!(arena.obstacle(*id).is_some());
        }
    }

    #[test]
    fn test_destroyed_obstacle_is_not_hit() {
        let now = Instant::now();
        let obstacle = Obstacle::new(9, Point::new(100.0, 100.0), 10, 50.0);
        let arena = Arena::with_layout(1000.0, 1000.0, generate_spawns(1000.0, 1000.0, 4), vec![obstacle]);
        let probe = Aabb::new(Point::new(110.0, 110.0), 5.0);
        assert_eq!(arena.first_obstacle_hit(&probe).map(|(id, _)| id), Some(9));

        let shared = arena.obstacle(9).unwrap();
        assert!(shared.write().take_damage(10, now));
        assert!(arena.first_obstacle_hit(&probe).is_none());

        arena.advance_obstacles(now + REGENERATION_DELAY);
        assert!(arena.first_obstacle_hit(&probe).is_some());
    }
}
