//! HTTP and WebSocket front end.
//!
//! `POST /player/create` swaps a bot for a new player and returns the arena;
//! `GET /connect/{id}` upgrades to the WebSocket carrying inputs in and world
//! updates out.

use crate::config::Config;
use crate::entity::{EntityId, SharedSquare};
use crate::world::World;
use axum::{
    Json, Router,
    extract::{
        ConnectInfo, Path, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::{SinkExt, StreamExt};
use protocol::packets::{CONNECT_PLAYER_ROUTE, CREATE_PLAYER_ROUTE};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

pub mod client;
pub mod game;
pub mod session;

pub use game::run_game_loop;
pub use session::{Session, SessionError};

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::Full => StatusCode::SERVICE_UNAVAILABLE,
            SessionError::UnknownPlayer(_) | SessionError::NotAPlayer(_) => StatusCode::NOT_FOUND,
            SessionError::AlreadyConnected(_) => StatusCode::CONFLICT,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the router for a session.
pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route(CREATE_PLAYER_ROUTE, post(create_player_handler))
        .route(&format!("{CONNECT_PLAYER_ROUTE}{{id}}"), get(connect_player_handler))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(session)
}

/// Create the world, start the game loop and serve until the listener fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from((config.server.bind_address(), config.server.port));
    let tick_interval = config.server.tick_interval();

    let session = Arc::new(Session::new(World::new(config)));

    let game_loop_session = Arc::clone(&session);
    tokio::spawn(async move {
        run_game_loop(game_loop_session, tick_interval).await;
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);
    info!("Join endpoint: POST http://{}{}", addr, CREATE_PLAYER_ROUTE);

    axum::serve(
        listener,
        router(session).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn create_player_handler(
    State(session): State<Arc<Session>>,
) -> Result<impl IntoResponse, SessionError> {
    match session.join() {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            info!("Join refused: {}", e);
            Err(e)
        }
    }
}

async fn connect_player_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<EntityId>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(session): State<Arc<Session>>,
) -> Result<Response, SessionError> {
    if let Err(e) = session.can_attach(id) {
        warn!("Connect for {} from {} refused: {}", id, addr, e);
        return Err(e);
    }
    Ok(ws.on_upgrade(move |socket| handle_websocket(socket, id, addr, session)))
}

/// Drive one player connection until it closes, then hand the slot back to a bot.
async fn handle_websocket(mut socket: WebSocket, id: EntityId, addr: SocketAddr, session: Arc<Session>) {
    let (square, outbound) = match session.attach(id, addr) {
        Ok(attached) => attached,
        Err(e) => {
            warn!("Closing connection from {}: {}", addr, e);
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: Utf8Bytes::from(e.to_string()),
                })))
                .await;
            return;
        }
    };

    connection_loop(socket, &square, outbound, addr, &session).await;
    session.leave(id);
}

async fn connection_loop(
    socket: WebSocket,
    square: &SharedSquare,
    mut outbound: mpsc::Receiver<Utf8Bytes>,
    addr: SocketAddr,
    session: &Session,
) {
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => session.submit_input(square, text.as_bytes()),
                    Some(Ok(Message::Binary(data))) => session.submit_input(square, &data),
                    Some(Ok(Message::Close(frame))) => {
                        match frame {
                            Some(f) if f.code != close_code::NORMAL && f.code != close_code::AWAY => {
                                warn!("Client {} closed with code {}: {}", addr, f.code, f.reason);
                            }
                            _ => info!("Client {} disconnected", addr),
                        }
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        debug!("Client {} stream ended", addr);
                        break;
                    }
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                if let Err(e) = write.send(Message::Text(frame)).await {
                    warn!("Failed to send world update to {}: {}", addr, e);
                    break;
                }
            }
        }
    }

    let _ = write.close().await;
}
