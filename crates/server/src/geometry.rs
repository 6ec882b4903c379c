//! 2D geometry primitives.

use glam::Vec2;

/// A position in world coordinates (top-left origin, y grows downwards).
pub type Point = Vec2;

/// A direction or displacement.
pub type Vector = Vec2;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Normalize `v` in place. A zero vector is left untouched.
#[inline]
pub fn normalize(v: &mut Vector) {
    let length = v.length();
    if length > 0.0 {
        *v /= length;
    }
}

/// Normalized copy of `v` (zero stays zero).
#[inline]
pub fn normalized(mut v: Vector) -> Vector {
    normalize(&mut v);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_normalize() {
        let mut v = Vector::new(3.0, -4.0);
        normalize(&mut v);
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.y + 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_is_noop() {
        let mut v = Vector::ZERO;
        normalize(&mut v);
        assert_eq!(v, Vector::ZERO);
        assert!(!v.x.is_nan());
    }
}
