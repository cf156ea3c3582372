//! WebSocket handler: one connection drives one game session

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::broadcast::FrameReceiver;
use crate::config::GameConfig;
use crate::game::GameSession;
use crate::protocol::{ClientMessage, ServerMessage, SessionQuery};
use crate::rate_limiter::RateDecision;
use crate::state::AppState;

/// WebSocket upgrade handler
///
/// The query string picks mode, difficulty and policy; a bad selection is
/// refused before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<SessionQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match query.into_config() {
        Ok(config) => ws.on_upgrade(move |socket| handle_socket(socket, state, config)),
        Err(e) => {
            warn!("Rejected session request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, config: GameConfig) {
    let mut session = match GameSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create session: {}", e);
            return;
        }
    };
    let session_id = session.id();

    // Subscribe before starting so the first tick is not missed
    let frames = session.subscribe();

    let (mut sender, mut receiver) = socket.split();

    let start_msg = ServerMessage::Start {
        session_id,
        config: session.config(),
    };
    if sender.send(Message::Text(start_msg.to_json().into())).await.is_err() {
        error!("Failed to send start message to session {}", session_id);
        return;
    }

    if let Err(e) = session.start() {
        error!("Session {} did not start: {}", session_id, e);
        return;
    }
    state.register(&session);
    info!("Session {} connected", session_id);

    let mut send_task = tokio::spawn(forward_frames(sender, frames, state.clone(), session_id));

    let send_done = tokio::select! {
        _ = &mut send_task => true,
        kicked = receive_commands(&mut receiver, &session, &state) => {
            if kicked {
                warn!("Session {} was kicked", session_id);
            }
            false
        }
    };

    session.end_game_and_cleanup();
    session.wait().await;
    // Dropping the last handle closes the frame channel, which ends the send task
    drop(session);
    if !send_done {
        let _ = send_task.await;
    }

    state.unregister(&session_id);
    info!("Session {} disconnected", session_id);
}

/// Push every frame to the client, plus a game over notice when the game finishes on its own
async fn forward_frames(
    mut sender: SplitSink<WebSocket, Message>,
    mut frames: FrameReceiver,
    state: Arc<AppState>,
    session_id: Uuid,
) {
    let mut announced = false;
    loop {
        match frames.recv().await {
            Ok(frame) => {
                let json = ServerMessage::Frame(&frame).to_json();
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                if announced {
                    continue;
                }
                if let Some(over) = ServerMessage::game_over(&frame) {
                    announced = true;
                    state.event_logger.log_game_over(session_id, &frame);
                    if sender.send(Message::Text(over.to_json().into())).await.is_err() {
                        break;
                    }
                }
            }
            Err(RecvError::Lagged(n)) => {
                warn!("Session {} client lagged by {} frames", session_id, n);
            }
            Err(RecvError::Closed) => {
                break;
            }
        }
    }
    let _ = sender.close().await;
}

/// Apply client commands until the socket closes; true if the client was kicked
async fn receive_commands(
    receiver: &mut SplitStream<WebSocket>,
    session: &GameSession,
    state: &AppState,
) -> bool {
    let session_id = session.id();

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::parse(text.as_str()) {
                Some(ClientMessage::Direction(dir)) => {
                    match state.rate_limiter.check_command(&session_id) {
                        RateDecision::Allowed => {}
                        RateDecision::Limited(count) => {
                            warn!("Session {} rate limited (violation {})", session_id, count);
                            state.event_logger.log_rate_violation(session_id, count);
                            continue;
                        }
                        RateDecision::Kick => {
                            warn!("Session {} kicked for rate limit violations", session_id);
                            state.event_logger.log_kick(session_id, "rate_limit_exceeded");
                            return true;
                        }
                    }

                    if session.set_player_direction(dir) {
                        debug!("Session {} direction: {:?}", session_id, dir);
                        state.event_logger.log_direction(session_id, dir);
                    }
                }
                Some(ClientMessage::Stop) => {
                    session.stop_game_loop();
                    state.event_logger.log_stopped(session_id);
                }
                Some(ClientMessage::Ping) => {
                    debug!("Ping from session {}", session_id);
                }
                None => {
                    debug!("Session {} sent unknown command: {}", session_id, text.as_str());
                }
            },
            Ok(Message::Close(_)) => {
                info!("Session {} sent close frame", session_id);
                break;
            }
            Ok(_) => {
                // Ignore binary, ping, pong frames
            }
            Err(e) => {
                error!("WebSocket error for session {}: {}", session_id, e);
                break;
            }
        }
    }

    false
}
