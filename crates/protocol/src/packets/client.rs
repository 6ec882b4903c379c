//! Client -> Server packet parsing.

use crate::{Point, ProtocolError};
use serde::{Deserialize, Serialize};

/// Per-tick input record sent by a player over the WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    #[serde(default)]
    pub left_key_pressed: bool,
    #[serde(default)]
    pub up_key_pressed: bool,
    #[serde(default)]
    pub right_key_pressed: bool,
    #[serde(default)]
    pub down_key_pressed: bool,
    /// Whether the fire button is held this tick.
    #[serde(default)]
    pub shot: bool,
    /// Aim point in world coordinates.
    #[serde(default)]
    pub aim: Point,
}

impl PlayerInput {
    /// Parse a player input from a raw text or binary frame.
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::Empty);
        }

        let input: PlayerInput = serde_json::from_slice(data)?;
        if !input.aim.x.is_finite() || !input.aim.y.is_finite() {
            return Err(ProtocolError::NonFinite("aim"));
        }
        Ok(input)
    }

    /// Encode the input as a JSON frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
