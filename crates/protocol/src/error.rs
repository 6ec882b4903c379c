//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding packets.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Empty message")]
    Empty,

    #[error("Malformed packet: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Non-finite coordinate in {0}")]
    NonFinite(&'static str),
}
