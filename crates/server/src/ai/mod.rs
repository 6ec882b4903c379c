//! Bot AI.
//!
//! Bots do not read input; each tick the world asks these functions what a bot
//! should do given a copy of everyone else's state.

mod bot;

pub use bot::{BLIND_ZONE_FACTOR, Contact, find_enemy, moving_vector, shooting_point, weakest_bot};
