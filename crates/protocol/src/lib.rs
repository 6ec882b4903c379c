//! Shared protocol crate for square-arena.
//!
//! This crate contains:
//! - Packet definitions exchanged between server and clients
//! - The JSON codec used on both the HTTP join endpoint and the WebSocket
//! - Shared types (Color, Point, etc.)

mod error;
pub mod packets;

pub use error::ProtocolError;
use serde::{Deserialize, Serialize};

/// RGB color used for squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Brightness test used when picking square colors (r + g + b above half of the maximum).
    #[inline]
    pub const fn is_bright(&self) -> bool {
        self.r as u16 + self.g as u16 + self.b as u16 > 382
    }
}

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// A point in world coordinates as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Position> for Point {
    fn from(v: Position) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for Position {
    fn from(p: Point) -> Self {
        Position::new(p.x, p.y)
    }
}
