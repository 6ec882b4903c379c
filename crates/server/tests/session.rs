//! End-to-end tests: HTTP join, WebSocket connect, broadcast and disconnect.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use protocol::packets::{CREATE_PLAYER_ROUTE, CreatePlayerResponse, PlayerInput, WorldUpdate};
use server::arena::{Arena, ObstacleLevel};
use server::server::run_game_loop;
use server::{Config, Session, World, router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

fn session(players: usize) -> Arc<Session> {
    let mut config = Config::default();
    config.session.player_count = players;
    config.server.tick_interval_ms = 10;
    let arena = Arena::create(players, ObstacleLevel::Low, &config);
    Arc::new(Session::new(World::with_arena(config, arena)))
}

async fn join(session: &Arc<Session>) -> (StatusCode, Vec<u8>) {
    let request = Request::post(CREATE_PLAYER_ROUTE)
        .body(Body::empty())
        .unwrap();
    let response = router(Arc::clone(session)).oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

/// Serve the session on an ephemeral port with the game loop running.
async fn serve(session: &Arc<Session>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::clone(session)).into_make_service_with_connect_info::<SocketAddr>();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let game_session = Arc::clone(session);
    let tick = game_session.world().config().server.tick_interval();
    tokio::spawn(run_game_loop(game_session, tick));
    addr
}

async fn connect(addr: SocketAddr, id: u64) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/connect/{id}")).await.unwrap();
    ws
}

async fn next_update(ws: &mut Client) -> WorldUpdate {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = msg {
            return WorldUpdate::parse(text.as_bytes()).unwrap();
        }
    }
}

async fn wait_for_players(session: &Session, expected: usize) {
    timeout(WAIT, async {
        while session.world().player_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn join_returns_authoritative_arena() {
    let session = session(4);
    let (status, body) = join(&session).await;
    assert_eq!(status, StatusCode::CREATED);

    let response = CreatePlayerResponse::parse(&body).unwrap();
    assert_eq!(response.arena, session.world().arena().view());
    assert!(!response.player.is_bot);
    assert!(response.arena.spawns.contains(&response.player.position));
    assert_eq!(session.world().player_count(), 1);
    assert_eq!(session.world().square_count(), 4);
}

#[tokio::test]
async fn join_into_full_arena_is_refused() {
    let session = session(4);
    for _ in 0..4 {
        assert_eq!(join(&session).await.0, StatusCode::CREATED);
    }
    let (status, _) = join(&session).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(session.world().square_count(), 4);
}

#[tokio::test]
async fn connect_to_unknown_id_is_refused() {
    let session = session(4);
    let addr = serve(&session).await;
    let err = connect_async(format!("ws://{addr}/connect/12345")).await.unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn connected_player_receives_updates_and_leaves_cleanly() {
    let session = session(4);
    let addr = serve(&session).await;

    let (_, body) = join(&session).await;
    let player = CreatePlayerResponse::parse(&body).unwrap().player;
    let mut ws = connect(addr, player.id).await;

    let update = next_update(&mut ws).await;
    assert_eq!(update.squares.len(), 4);
    let me = update.square(player.id).unwrap();
    assert!(!me.is_bot);
    assert_eq!(update.obstacles.len(), session.world().arena().obstacle_count());

    // Garbage does not cost the connection.
    ws.send(Message::text("definitely not json")).await.unwrap();
    let input = PlayerInput {
        right_key_pressed: true,
        ..Default::default()
    };
    ws.send(Message::text(input.encode().unwrap())).await.unwrap();
    let update = next_update(&mut ws).await;
    assert!(update.square(player.id).is_some());

    // A second connection for the same player is refused.
    assert!(connect_async(format!("ws://{addr}/connect/{}", player.id)).await.is_err());

    ws.close(None).await.unwrap();
    wait_for_players(&session, 0).await;
    assert_eq!(session.world().square_count(), 4);
    assert!(session.world().square(player.id).is_none());
}

#[tokio::test]
async fn bot_id_cannot_be_connected() {
    let session = session(4);
    let addr = serve(&session).await;
    let bot = *session.world().snapshot().squares.keys().next().unwrap();
    let err = connect_async(format!("ws://{addr}/connect/{bot}")).await.unwrap_err();
    assert!(matches!(err, tokio_tungstenite::tungstenite::Error::Http(_)));
}
