//! Square arena game server library.
//!
//! Authoritative simulation of a top-down arena shooter: the arena and its
//! obstacles, the squares (players and bots), bot AI, collisions and the
//! HTTP/WebSocket session layer that feeds inputs in and broadcasts state out.

pub mod ai;
pub mod arena;
pub mod collision;
pub mod config;
pub mod entity;
pub mod geometry;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{Session, SessionError, router, run};
pub use world::World;
