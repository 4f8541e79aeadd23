//! WebSocket handler for the notification channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use opsboard_core::{events, Frame};
use tracing::{debug, warn};

use crate::hub::{BroadcastHub, PeerId};
use crate::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (peer_id, mut outbound) = state.hub.register().await;

    // Forward this peer's queue to its socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let json = match frame.encode() {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Could not encode frame");
                    continue;
                }
            };
            debug!(peer_id = %peer_id, message = %json, "Sending frame to peer");
            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!(peer_id = %peer_id, "WebSocket send failed, peer disconnected");
                break;
            }
        }
    });

    // Handle incoming frames from the peer
    let hub = state.hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if !handle_text(&hub, &peer_id, text.as_str()).await {
                        break;
                    }
                }
                Message::Close(_) => {
                    debug!(peer_id = %peer_id, "Peer sent close frame");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.unregister(&peer_id).await;
}

/// Process one text frame. Returns `false` when the peer is leaving.
async fn handle_text(hub: &BroadcastHub, peer_id: &PeerId, text: &str) -> bool {
    let frame = match Frame::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(peer_id = %peer_id, error = %e, "Ignoring malformed frame");
            return true;
        }
    };

    match frame.event.as_str() {
        events::NOTIFICATION if frame.data.is_object() => {
            hub.relay(peer_id, frame.data).await;
        }
        events::NOTIFICATION => {
            warn!(peer_id = %peer_id, payload = %frame.data, "Ignoring notification that is not an object");
        }
        events::DISCONNECT => return false,
        other => debug!(peer_id = %peer_id, event = %other, "Ignoring unhandled event"),
    }
    true
}
