//! Collision detection and resolution.
//!
//! Every entity in the arena is an axis-aligned square described by its top-left
//! corner and side length. This module handles:
//! - Overlap tests between two boxes
//! - Push-out of a moving square along the axis of least penetration
//! - Bullet ricochet off obstacles
//! - Border clamping

use crate::geometry::{Point, Vector};

/// An axis-aligned square: top-left corner plus side length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub position: Point,
    pub size: f32,
}

/// Which axis a collision was resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Aabb {
    #[inline]
    pub const fn new(position: Point, size: f32) -> Self {
        Self { position, size }
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.position + Vector::splat(self.size / 2.0)
    }

    /// Boxes collide unless one's far edge lies strictly before the other's near edge on
    /// either axis. Touching edges count as a collision.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a, b) = (self.position, other.position);

        let separated_x = if a.x < b.x {
            a.x + self.size < b.x
        } else {
            b.x + other.size < a.x
        };
        if separated_x {
            return false;
        }

        let separated_y = if a.y < b.y {
            a.y + self.size < b.y
        } else {
            b.y + other.size < a.y
        };
        !separated_y
    }
}

/// Axis along which two boxes are pushed apart: the one with the larger centre offset.
#[inline]
fn contact_axis(mover: &Aabb, obstacle: &Aabb) -> (Axis, Vector) {
    let diff = mover.center() - obstacle.center();
    if diff.x.abs() > diff.y.abs() {
        (Axis::Horizontal, diff)
    } else {
        (Axis::Vertical, diff)
    }
}

/// Move `mover` so that it sits flush against `obstacle` on the side it came from.
/// Returns the axis that was corrected.
pub fn push_out(mover: &mut Aabb, obstacle: &Aabb) -> Axis {
    let (axis, diff) = contact_axis(mover, obstacle);
    match axis {
        Axis::Horizontal => {
            mover.position.x = if diff.x >= 0.0 {
                obstacle.position.x + obstacle.size
            } else {
                obstacle.position.x - mover.size
            };
        }
        Axis::Vertical => {
            mover.position.y = if diff.y >= 0.0 {
                obstacle.position.y + obstacle.size
            } else {
                obstacle.position.y - mover.size
            };
        }
    }
    axis
}

/// Push `mover` out of `obstacle` only when they overlap. Returns true if it moved.
pub fn resolve(mover: &mut Aabb, obstacle: &Aabb) -> bool {
    if !mover.overlaps(obstacle) {
        return false;
    }
    push_out(mover, obstacle);
    true
}

/// Place a bullet on the surface of `obstacle` and reflect its direction on the impacted axis.
pub fn ricochet(bullet: &mut Aabb, direction: &mut Vector, obstacle: &Aabb) {
    match push_out(bullet, obstacle) {
        Axis::Horizontal => direction.x = -direction.x,
        Axis::Vertical => direction.y = -direction.y,
    }
}

/// Clamp a box into `[0, width] x [0, height]`. Returns true if it was over a border.
pub fn clamp_to_border(position: &mut Point, size: f32, width: f32, height: f32) -> bool {
    let mut over = false;
    if position.x + size > width {
        position.x = width - size;
        over = true;
    }
    if position.y + size > height {
        position.y = height - size;
        over = true;
    }
    if position.x < 0.0 {
        position.x = 0.0;
        over = true;
    }
    if position.y < 0.0 {
        position.y = 0.0;
        over = true;
    }
    over
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(x: f32, y: f32, size: f32) -> Aabb {
        Aabb::new(Point::new(x, y), size)
    }

    #[test]
    fn test_overlap() {
        assert!(aabb(0.0, 0.0, 10.0).overlaps(&aabb(5.0, 5.0, 10.0)));
        assert!(aabb(5.0, 5.0, 10.0).overlaps(&aabb(0.0, 0.0, 10.0)));
        // Small box fully inside a big one.
        assert!(aabb(0.0, 0.0, 100.0).overlaps(&aabb(40.0, 40.0, 5.0)));
    }

    #[test]
    fn test_touching_edges_collide() {
        assert!(aabb(0.0, 0.0, 10.0).overlaps(&aabb(10.0, 0.0, 10.0)));
        assert!(aabb(0.0, 0.0, 10.0).overlaps(&aabb(0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_no_overlap() {
        assert!(!aabb(0.0, 0.0, 10.0).overlaps(&aabb(10.5, 0.0, 10.0)));
        assert!(!aabb(0.0, 20.0, 10.0).overlaps(&aabb(0.0, 0.0, 10.0)));
        // Overlapping on x only.
        assert!(!aabb(0.0, 0.0, 10.0).overlaps(&aabb(5.0, 50.0, 10.0)));
    }

    #[test]
    fn test_push_out_horizontal() {
        let obstacle = aabb(100.0, 100.0, 50.0);
        let mut mover = aabb(140.0, 105.0, 30.0);
        assert_eq!(push_out(&mut mover, &obstacle), Axis::Horizontal);
        assert_eq!(mover.position, Point::new(150.0, 105.0));

        let mut mover = aabb(75.0, 110.0, 30.0);
        push_out(&mut mover, &obstacle);
        assert_eq!(mover.position, Point::new(70.0, 110.0));
    }

    #[test]
    fn test_push_out_vertical() {
        let obstacle = aabb(100.0, 100.0, 50.0);
        let mut mover = aabb(110.0, 80.0, 30.0);
        assert_eq!(push_out(&mut mover, &obstacle), Axis::Vertical);
        assert_eq!(mover.position, Point::new(110.0, 70.0));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let obstacle = aabb(100.0, 100.0, 50.0);
        let mut mover = aabb(140.0, 105.0, 30.0);
        assert!(resolve(&mut mover, &obstacle));
        let first = mover;

        resolve(&mut mover, &obstacle);
        assert_eq!(mover, first);

        // A pair that never overlapped is left alone.
        let mut apart = aabb(300.0, 300.0, 30.0);
        assert!(!resolve(&mut apart, &obstacle));
        assert_eq!(apart.position, Point::new(300.0, 300.0));
    }

    #[test]
    fn test_ricochet_reflects_impacted_axis() {
        let obstacle = aabb(100.0, 100.0, 50.0);
        let mut bullet = aabb(96.0, 120.0, 8.0);
        let mut direction = Vector::new(1.0, 0.0);
        ricochet(&mut bullet, &mut direction, &obstacle);
        assert_eq!(direction, Vector::new(-1.0, 0.0));
        assert_eq!(bullet.position.x, 92.0);

        let mut bullet = aabb(120.0, 147.0, 8.0);
        let mut direction = Vector::new(0.6, -0.8);
        ricochet(&mut bullet, &mut direction, &obstacle);
        assert_eq!(direction, Vector::new(0.6, 0.8));
        assert_eq!(bullet.position.y, 150.0);
    }

    #[test]
    fn test_clamp_to_border() {
        let mut p = Point::new(995.0, -3.0);
        assert!(clamp_to_border(&mut p, 10.0, 1000.0, 500.0));
        assert_eq!(p, Point::new(990.0, 0.0));

        let mut inside = Point::new(10.0, 10.0);
        assert!(!clamp_to_border(&mut inside, 10.0, 1000.0, 500.0));
        assert_eq!(inside, Point::new(10.0, 10.0));
    }
}
