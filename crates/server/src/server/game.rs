//! Fixed-rate simulation and broadcast loop.

use super::session::Session;
use axum::extract::ws::Utf8Bytes;
use futures_util::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, warn};

/// Run one tick and push the resulting snapshot to every player, forever.
///
/// Bots keep playing while nobody is connected; only the snapshot is skipped then.
pub async fn run_game_loop(session: Arc<Session>, tick_interval: Duration) {
    let start = Instant::now() + tick_interval;
    let mut ticker = interval_at(start, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let tick_budget = tick_interval.mul_f64(0.9);
    let mut tick_count: u64 = 0;

    loop {
        let scheduled = ticker.tick().await;

        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let tick_start = std::time::Instant::now();
        tick_count += 1;
        session.world().tick(tick_start);

        if !session.world().player_links().is_empty() {
            match session.world().snapshot().encode() {
                Ok(json) => broadcast(&session, Utf8Bytes::from(json)),
                Err(e) => error!("Failed to encode world update: {}", e),
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed > tick_budget {
            warn!(
                "Slow tick #{}: {:?} (budget: {:?}) - {} squares",
                tick_count,
                elapsed,
                tick_budget,
                session.world().square_count()
            );
        }
    }
}

/// Queue `frame` for every connected player. A full or closed queue only affects its owner.
pub fn broadcast(session: &Session, frame: Utf8Bytes) {
    for (id, link) in session.world().player_links() {
        match link.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue of player {} ({}) is full, dropping update", id, link.addr);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Player {} is disconnecting, update not delivered", id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Arena, generate_spawns};
    use crate::config::Config;
    use crate::world::World;
    use std::net::SocketAddr;

    fn session() -> Arc<Session> {
        let arena = Arena::with_layout(800.0, 600.0, generate_spawns(800.0, 600.0, 4), Vec::new());
        Arc::new(Session::new(World::with_arena(Config::default(), arena)))
    }

    #[tokio::test]
    async fn test_slow_player_does_not_block_others() {
        let session = session();
        let addr = SocketAddr::from(([127, 0, 0, 1], 9000));

        let slow = session.join().unwrap().player.id;
        let fast = session.join().unwrap().player.id;
        let (_slow_square, _slow_rx) = session.attach(slow, addr).unwrap();
        let (_fast_square, mut fast_rx) = session.attach(fast, addr).unwrap();

        let buffer = Config::default().server.outbound_buffer;
        for i in 0..buffer + 3 {
            broadcast(&session, Utf8Bytes::from(format!("frame {i}")));
            // The fast player keeps draining its queue.
            assert_eq!(fast_rx.recv().await.unwrap().as_str(), format!("frame {i}"));
        }
    }

    #[tokio::test]
    async fn test_bots_play_without_players() {
        let session = session();
        let positions = |s: &Session| {
            let mut squares: Vec<_> = s.world().snapshot().squares.into_iter().collect();
            squares.sort_by_key(|(id, _)| *id);
            squares.into_iter().map(|(_, v)| v.position).collect::<Vec<_>>()
        };
        let before = positions(&session);

        let game = tokio::spawn(run_game_loop(Arc::clone(&session), Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(300)).await;
        game.abort();

        assert!(session.world().player_links().is_empty());
        assert_ne!(positions(&session), before);
    }

    #[tokio::test]
    async fn test_closed_link_is_skipped() {
        let session = session();
        let addr = SocketAddr::from(([127, 0, 0, 1], 9001));
        let id = session.join().unwrap().player.id;
        let (_square, rx) = session.attach(id, addr).unwrap();
        drop(rx);

        broadcast(&session, Utf8Bytes::from("update"));
        assert_eq!(session.world().player_links().len(), 1);
    }
}
