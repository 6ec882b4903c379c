use crate::entity::{EntityId, Square};
use crate::geometry::{Point, Vector, distance, normalized};
use rand::Rng;

/// Beyond `BLIND_ZONE_FACTOR * size` a bot neither chases nor shoots.
pub const BLIND_ZONE_FACTOR: f32 = 8.0;

/// Fraction of the arena, measured from each edge, where bots steer away from the wall.
const EDGE_MARGIN: f32 = 0.1;

/// Half-width of the random wander offset around the arena centre.
const WANDER_JITTER: f32 = 2.0;

/// Copy of the square fields bot decisions depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: EntityId,
    pub position: Point,
    pub size: f32,
    pub health: i32,
}

impl Contact {
    #[inline]
    pub fn center(&self) -> Point {
        self.position + Vector::splat(self.size / 2.0)
    }
}

impl From<&Square> for Contact {
    fn from(square: &Square) -> Self {
        Self {
            id: square.id,
            position: square.position,
            size: square.size,
            health: square.health,
        }
    }
}

/// Nearest other square by top-left distance.
///
/// Without one, the distance returned is `diagonal` (farther than anything in the arena).
pub fn find_enemy<I>(bot: &Contact, others: I, diagonal: f32) -> (Option<Contact>, f32)
where
    I: IntoIterator<Item = Contact>,
{
    let mut nearest = None;
    let mut min_distance = diagonal;

    for other in others {
        if other.id == bot.id {
            continue;
        }
        let d = distance(bot.position, other.position);
        if d < min_distance {
            min_distance = d;
            nearest = Some(other);
        }
    }

    (nearest, min_distance)
}

/// Unit movement vector for this tick.
///
/// Far from everyone the bot wanders toward the arena centre. Otherwise it chases its
/// enemy, or flees when it has less health, and turns away from walls it is about to hit.
pub fn moving_vector<R: Rng + ?Sized>(
    bot: &Contact,
    enemy: Option<&Contact>,
    enemy_distance: f32,
    width: f32,
    height: f32,
    rng: &mut R,
) -> Vector {
    let enemy = match enemy {
        Some(enemy) if enemy_distance <= bot.size * BLIND_ZONE_FACTOR => enemy,
        _ => {
            let jitter = Vector::new(
                (rng.random::<f32>() - 0.5) * WANDER_JITTER * 2.0,
                (rng.random::<f32>() - 0.5) * WANDER_JITTER * 2.0,
            );
            let center = Point::new(width / 2.0, height / 2.0);
            return normalized(center + jitter - bot.position);
        }
    };

    let mut vector = normalized(enemy.position - bot.position);
    if bot.health < enemy.health {
        vector = -vector;
    }

    avoid_walls(bot.position, &mut vector, width, height);
    vector
}

fn avoid_walls(position: Point, vector: &mut Vector, width: f32, height: f32) {
    let near_left = position.x < width * EDGE_MARGIN;
    let near_right = position.x > width * (1.0 - EDGE_MARGIN);
    let near_top = position.y < height * EDGE_MARGIN;
    let near_bottom = position.y > height * (1.0 - EDGE_MARGIN);

    if (near_right && vector.x > 0.0) || (near_left && vector.x < 0.0) {
        vector.x = -vector.x;
    }
    if (near_bottom && vector.y > 0.0) || (near_top && vector.y < 0.0) {
        vector.y = -vector.y;
    }
}

/// Where to shoot: the enemy's centre when it is close enough, otherwise nowhere.
pub fn shooting_point(enemy: Option<&Contact>, enemy_distance: f32) -> Option<Point> {
    let enemy = enemy?;
    (enemy_distance <= enemy.size * BLIND_ZONE_FACTOR).then(|| enemy.center())
}

/// Bot with the lowest kills-minus-deaths, ties going to the lowest id.
///
/// Items are `(id, is_bot, record)`.
pub fn weakest_bot<I>(squares: I) -> Option<EntityId>
where
    I: IntoIterator<Item = (EntityId, bool, i64)>,
{
    squares
        .into_iter()
        .filter(|&(_, is_bot, _)| is_bot)
        .min_by_key(|&(id, _, record)| (record, id))
        .map(|(id, _, _)| id)
}
