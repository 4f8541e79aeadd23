//! Peer registry introspection.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct PeersResponse {
    pub peers: usize,
}

/// GET /api/peers - Number of connected channels.
pub async fn count(State(state): State<AppState>) -> Json<PeersResponse> {
    Json(PeersResponse {
        peers: state.hub.peer_count().await,
    })
}
