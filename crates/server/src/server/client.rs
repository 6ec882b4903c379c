//! Per-connection state attached to a player square.

use axum::extract::ws::Utf8Bytes;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Handle to a connected player's outbound queue.
///
/// The connection task owns the receiving half and the WebSocket writer; the
/// broadcast loop only ever pushes into the bounded queue.
#[derive(Debug, Clone)]
pub struct Link {
    /// Remote address.
    pub addr: SocketAddr,
    /// When the WebSocket was attached.
    pub connected_at: Instant,
    outbound: mpsc::Sender<Utf8Bytes>,
}

impl Link {
    /// Create a link with an outbound queue of `capacity` frames.
    pub fn new(addr: SocketAddr, capacity: usize) -> (Self, mpsc::Receiver<Utf8Bytes>) {
        let (outbound, rx) = mpsc::channel(capacity);
        let link = Self {
            addr,
            connected_at: Instant::now(),
            outbound,
        };
        (link, rx)
    }

    /// Queue a frame without waiting. Fails if the queue is full or the connection is gone.
    #[inline]
    pub fn try_send(&self, frame: Utf8Bytes) -> Result<(), TrySendError<Utf8Bytes>> {
        self.outbound.try_send(frame)
    }

    /// Whether the connection task has dropped its end.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}
