//! Spawn point layout.

use crate::geometry::Point;

const SIDES: usize = 4;

/// Generate one spawn point per square along the arena edges.
///
/// The four corners always come first. The remaining points are spread evenly over the
/// top, right, bottom and left edges (in that order), `ceil(remaining / 4)` slots per edge,
/// stopping as soon as `count` points exist.
pub fn generate_spawns(width: f32, height: f32, count: usize) -> Vec<Point> {
    let mut spawns = Vec::with_capacity(count.max(SIDES));
    spawns.push(Point::new(0.0, 0.0));
    spawns.push(Point::new(width, 0.0));
    spawns.push(Point::new(0.0, height));
    spawns.push(Point::new(width, height));

    let remaining = count.saturating_sub(SIDES);
    if remaining == 0 {
        return spawns;
    }

    let per_side = remaining.div_ceil(SIDES);
    let step_x = width / (per_side + 1) as f32;
    let step_y = height / (per_side + 1) as f32;

    for side in 0..SIDES {
        for i in 1..=per_side {
            if i + side * per_side > remaining {
                break;
            }
            let offset = i as f32;
            spawns.push(match side {
                0 => Point::new(offset * step_x, 0.0),
                1 => Point::new(width, offset * step_y),
                2 => Point::new(offset * step_x, height),
                _ => Point::new(0.0, offset * step_y),
            });
        }
    }

    spawns
}
