//! Server -> Client packet building.

use crate::packets::BULLET_SLOTS;
use crate::{Color, Point, ProtocolError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Obstacle state as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub id: u64,
    pub position: Point,
    pub health: i32,
    pub size: f32,
    pub vulnerable: bool,
}

/// A bullet in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    pub position: Point,
    /// Unit direction vector.
    pub vector: Point,
    pub size: f32,
    pub speed: f32,
    pub damage: i32,
}

/// Square (player or bot) state as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareView {
    pub id: u64,
    pub position: Point,
    pub health: i32,
    pub speed: f32,
    pub size: f32,
    /// Fixed-size slot array; `None` marks an empty slot.
    pub bullets: [Option<BulletView>; BULLET_SLOTS],
    pub kills: u32,
    pub deaths: u32,
    pub color: Color,
    pub is_bot: bool,
}

/// Static arena layout sent once in the join response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaView {
    pub width: f32,
    pub height: f32,
    pub obstacles: BTreeMap<u64, ObstacleView>,
    pub spawns: Vec<Point>,
}

/// Response body of the join endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePlayerResponse {
    pub arena: ArenaView,
    pub player: SquareView,
}

impl CreatePlayerResponse {
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// World state broadcast every tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldUpdate {
    pub obstacles: BTreeMap<u64, ObstacleView>,
    pub squares: BTreeMap<u64, SquareView>,
}

impl WorldUpdate {
    /// Encode the update as a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an update received from the server.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_slice(data)?)
    }

    /// The square owned by `id`, used by clients to follow their own player.
    pub fn square(&self, id: u64) -> Option<&SquareView> {
        self.squares.get(&id)
    }
}
