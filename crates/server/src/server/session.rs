//! Player lifecycle: join, connect, input and leave.

use super::client::Link;
use crate::entity::{EntityId, SharedSquare};
use crate::world::World;
use axum::extract::ws::Utf8Bytes;
use protocol::packets::{CreatePlayerResponse, PlayerInput};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Reasons a join or connect request is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("arena is full")]
    Full,

    #[error("no square with id {0}")]
    UnknownPlayer(EntityId),

    #[error("square {0} is a bot")]
    NotAPlayer(EntityId),

    #[error("player {0} is already connected")]
    AlreadyConnected(EntityId),
}

/// The running session shared by the HTTP handlers and the game loop.
#[derive(Debug)]
pub struct Session {
    world: World,
    join_timeout: Duration,
    outbound_buffer: usize,
}

impl Session {
    pub fn new(world: World) -> Self {
        let join_timeout = world.config().server.join_timeout();
        let outbound_buffer = world.config().server.outbound_buffer;
        Self {
            world,
            join_timeout,
            outbound_buffer,
        }
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Swap the weakest bot for a new player and describe the result.
    ///
    /// The slot is reserved for `join_timeout`; if no WebSocket attaches by then it
    /// goes back to a bot.
    pub fn join(self: &Arc<Self>) -> Result<CreatePlayerResponse, SessionError> {
        let player = self.world.swap_in_player().ok_or(SessionError::Full)?;
        let (id, view) = {
            let p = player.read();
            (p.id, p.view())
        };
        info!("Player {} joined", id);

        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(session.join_timeout).await;
            if let Some(bot_id) = session.world.reclaim_if_unattached(id) {
                warn!(
                    "Player {} never connected, slot reclaimed by bot {}",
                    id, bot_id
                );
            }
        });

        Ok(CreatePlayerResponse {
            arena: self.world.arena().view(),
            player: view,
        })
    }

    /// Check that `id` names a player without a connection, without claiming it.
    pub fn can_attach(&self, id: EntityId) -> Result<(), SessionError> {
        let square = self.world.square(id).ok_or(SessionError::UnknownPlayer(id))?;
        let square = square.read();
        if square.is_bot {
            return Err(SessionError::NotAPlayer(id));
        }
        if square.link.is_some() {
            return Err(SessionError::AlreadyConnected(id));
        }
        Ok(())
    }

    /// Claim the player slot for a new connection.
    ///
    /// Returns the square (so inputs can be stored without the session map) and the
    /// receiving end of its outbound queue.
    pub fn attach(
        &self,
        id: EntityId,
        addr: SocketAddr,
    ) -> Result<(SharedSquare, mpsc::Receiver<Utf8Bytes>), SessionError> {
        let (link, rx) = Link::new(addr, self.outbound_buffer);
        let square = self.world.attach(id, link)?;
        info!("Player {} connected from {}", id, addr);
        Ok((square, rx))
    }

    /// Store a raw input frame as the player's latest input.
    ///
    /// Malformed frames are logged and dropped; the previous input stays queued.
    pub fn submit_input(&self, square: &SharedSquare, data: &[u8]) {
        match PlayerInput::parse(data) {
            Ok(input) => square.write().input = Some(input),
            Err(e) => {
                let id = square.read().id;
                warn!("Bad input from player {}: {}", id, e);
            }
        }
    }

    /// Return the player's slot to a fresh bot.
    pub fn leave(&self, id: EntityId) {
        match self.world.swap_out_player(id) {
            Some(bot_id) => info!("Player {} left, replaced by bot {}", id, bot_id),
            None => warn!("Player {} left but was no longer in the arena", id),
        }
    }
}
