//! Packet definitions for the square-arena protocol.
//!
//! This module contains both client->server and server->client packet types.
//! Every packet travels as a JSON document: the join response in an HTTP body,
//! inputs and world updates as WebSocket frames.

mod client;
mod server;

pub use client::*;
pub use server::*;

/// HTTP route a client POSTs to in order to take over a bot slot.
pub const CREATE_PLAYER_ROUTE: &str = "/player/create";

/// HTTP route (followed by the square id) upgraded to the game WebSocket.
pub const CONNECT_PLAYER_ROUTE: &str = "/connect/";

/// Number of bullet slots every square owns.
pub const BULLET_SLOTS: usize = 3;
