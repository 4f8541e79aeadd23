//! Internal notification endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use opsboard_core::notification::model::{format_timestamp, next_id};
use opsboard_core::Notification;
use serde::Deserialize;
use tracing::{debug, info};

use crate::state::AppState;

/// Body of `POST /internal/notify`. Missing id and timestamp are filled in.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub id: Option<i64>,
    pub message: String,
    pub timestamp: Option<String>,
}

impl NotifyRequest {
    fn into_notification(self) -> Notification {
        let now = Utc::now();
        let timestamp = self.timestamp.unwrap_or_else(|| format_timestamp(now));
        let id = self.id.unwrap_or_else(|| next_id(now.timestamp_millis()));
        Notification::with_id(id, self.message, timestamp)
    }
}

/// Receive a notification and broadcast to all connected peers.
pub async fn notify(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> (StatusCode, Json<Notification>) {
    let notification = req.into_notification();
    info!(id = notification.id, message = %notification.message, "Received internal notification, broadcasting to peers");
    let delivered = state.hub.broadcast(&notification).await;
    debug!(delivered, "Internal notification delivered");
    (StatusCode::OK, Json(notification))
}
