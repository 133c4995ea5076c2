//! Realtime WebSocket endpoint
//!
//! GET /ws?branchCode=<code>&role=<role>
//!
//! 协议:
//! - Server → Client: `{"event": "order-created" | "order:created" | ..., "data": Order}`
//! - Client → Server: `{"event": "join-branch", "data": "BR01"}`, `{"event": "join-admins"}`

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use shared::realtime::ClientCommand;
use std::sync::Arc;
use tokio::time::Duration;

use super::hub::{Handshake, RealtimeHub, SubscriberId, Subscription};
use crate::core::ServerState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handle_ws))
}

/// GET /ws
pub async fn handle_ws(
    State(state): State<ServerState>,
    Query(handshake): Query<Handshake>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| ws_session(socket, hub, handshake))
}

async fn ws_session(socket: WebSocket, hub: Arc<RealtimeHub>, handshake: Handshake) {
    let (mut sink, mut stream) = socket.split();
    let Subscription { id, mut rx } = hub.connect(&handshake);

    tracing::info!(
        subscriber = id,
        rooms = ?hub.rooms_of(id),
        "Realtime WS connected"
    );

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            frame = rx.recv() => {
                match frame {
                    Some(text) => {
                        if sink.send(Message::Text(text.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_command(&hub, id, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(subscriber = id, error = %e, "Realtime WS read error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    hub.disconnect(id);
    tracing::info!(subscriber = id, "Realtime WS disconnected");
}

fn handle_command(hub: &RealtimeHub, id: SubscriberId, text: &str) {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(ClientCommand::JoinBranch(branch_code)) => {
            hub.join_branch(id, &branch_code);
        }
        Ok(ClientCommand::JoinAdmins) => {
            hub.join_admins(id);
        }
        Err(e) => {
            tracing::debug!(subscriber = id, error = %e, "Ignoring unrecognised realtime frame");
        }
    }
}
