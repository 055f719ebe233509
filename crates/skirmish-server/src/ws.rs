//! `WebSocket` session handling for spectators.
//!
//! Each connection gets a stable [`PlayerId`] (its vote identity), an
//! immediate full sync, and then the live frame stream. The session
//! task filters follower-scoped frames against its own follow state and
//! answers inspect / follow / thinking requests directly from a
//! read-locked world snapshot. Votes are queued to the driver.
//!
//! A session that falls behind the bounded broadcast buffer is
//! disconnected; the client reconnects and resynchronizes via the
//! full sync.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use skirmish_core::Vote;
use skirmish_types::{AgentId, ClientMessage, PlayerId, ServerMessage};
use tracing::{debug, warn};

use crate::state::{AppState, Intent, Scope};

/// Default number of thinking entries returned when none is requested.
const DEFAULT_THINKING_LIMIT: usize = 10;

/// Upgrade an HTTP request to a `WebSocket` spectator session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_session(socket, state))
}

/// Drive one spectator session to completion.
async fn handle_session(mut socket: WebSocket, state: AppState) {
    let player_id = PlayerId::new();
    debug!(%player_id, "spectator connected");

    // Subscribe before snapshotting so no tick falls in the gap.
    let mut rx = state.subscribe();

    let full_sync = {
        let world = state.world.read().await;
        world.full_sync()
    };
    if send_message(&mut socket, &full_sync).await.is_err() {
        return;
    }

    let mut followed: Option<AgentId> = None;

    loop {
        tokio::select! {
            // A frame from the tick driver.
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        let deliver = match frame.scope {
                            Scope::All => true,
                            Scope::Followers(agent_id) => followed == Some(agent_id),
                        };
                        if deliver
                            && socket
                                .send(Message::Text(frame.payload.to_string().into()))
                                .await
                                .is_err()
                        {
                            debug!(%player_id, "spectator disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        // Too slow for the bounded buffer: cut the
                        // session; a reconnect gets a fresh full sync.
                        warn!(%player_id, skipped, "spectator lagged, disconnecting");
                        return;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("broadcast channel closed, ending session");
                        return;
                    }
                }
            }
            // A message from the spectator.
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_client_message(&text, &state, &mut socket, &mut followed, player_id).await {
                            return;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%player_id, "spectator disconnected");
                        return;
                    }
                    Some(Err(e)) => {
                        debug!(%player_id, error = %e, "websocket error");
                        return;
                    }
                    _ => {
                        // Binary and pong frames are ignored.
                    }
                }
            }
        }
    }
}

/// Handle one inbound message. Returns `false` when the session should
/// end. Malformed or unknown messages are logged and ignored; they
/// never touch world state.
async fn handle_client_message(
    text: &str,
    state: &AppState,
    socket: &mut WebSocket,
    followed: &mut Option<AgentId>,
    player_id: PlayerId,
) -> bool {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(%player_id, error = %e, "ignoring malformed client message");
            return true;
        }
    };

    match message {
        ClientMessage::VoteSubmit { agent_id, action } => {
            let vote = Vote {
                agent_id,
                action,
                player_id,
            };
            if state.intents.send(Intent::VoteSubmit(vote)).await.is_err() {
                warn!("intent queue closed, ending session");
                return false;
            }
            true
        }
        ClientMessage::AgentInspect { agent_id } => {
            let reply = {
                let world = state.world.read().await;
                world
                    .agents
                    .get(&agent_id)
                    .map(|agent| (world.tick, agent.snapshot()))
            };
            if let Some((tick, agent)) = reply {
                return send_message(socket, &ServerMessage::AgentDetail { tick, agent })
                    .await
                    .is_ok();
            }
            true
        }
        ClientMessage::AgentFollow { agent_id } => {
            *followed = agent_id;
            let Some(agent_id) = agent_id else {
                return true;
            };
            let reply = {
                let world = state.world.read().await;
                world
                    .agents
                    .get(&agent_id)
                    .map(|agent| (world.tick, agent.snapshot()))
            };
            if let Some((tick, agent)) = reply {
                return send_message(socket, &ServerMessage::AgentDetail { tick, agent })
                    .await
                    .is_ok();
            }
            true
        }
        ClientMessage::ThinkingRequest { agent_id, limit } => {
            let entries = {
                let world = state.world.read().await;
                world.thinking.history(
                    world.session_id,
                    agent_id,
                    limit.unwrap_or(DEFAULT_THINKING_LIMIT),
                )
            };
            send_message(
                socket,
                &ServerMessage::ThinkingHistory { agent_id, entries },
            )
            .await
            .is_ok()
        }
    }
}

/// Serialize and send one message on the socket.
async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let json = serde_json::to_string(message).map_err(|e| {
        warn!(error = %e, "failed to serialize reply");
    })?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
