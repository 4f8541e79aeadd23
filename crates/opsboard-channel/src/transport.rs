//! The publish/subscribe surface shared by every transport.

use std::fmt;
use std::sync::Arc;

use opsboard_core::notification::{self, NotificationFeed};
use opsboard_core::{events, Notification};
use serde_json::Value;
use tracing::warn;

use crate::handlers::Handler;

/// Lifecycle of a channel's network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    FailedPermanently,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::FailedPermanently => "failed-permanently",
        };
        f.write_str(s)
    }
}

/// Event-based publish/subscribe transport.
pub trait Transport: Send + Sync {
    /// Register `handler` for every message tagged `event`.
    fn on(&self, event: &str, handler: Handler);

    /// Fire-and-forget send.
    fn emit(&self, event: &str, payload: Value);

    /// Tear down. Safe to call repeatedly.
    fn disconnect(&self);

    fn emit_notification(&self, notification: &Notification) {
        match serde_json::to_value(notification) {
            Ok(payload) => self.emit(events::NOTIFICATION, payload),
            Err(e) => warn!(error = %e, "Could not encode notification"),
        }
    }

    /// Register a typed handler for `notification` events.
    ///
    /// Payloads that are not objects are logged and skipped.
    fn on_notification<F>(&self, handler: F)
    where
        F: Fn(Notification) + Send + Sync + 'static,
        Self: Sized,
    {
        self.on(
            events::NOTIFICATION,
            Arc::new(move |payload: &Value| match notification::from_payload(payload) {
                Ok(n) => handler(n),
                Err(e) => warn!(error = %e, "Skipping malformed notification"),
            }),
        );
    }
}

/// Feed every notification received on `transport` into `feed`.
pub fn attach_feed<T: Transport>(transport: &T, feed: &NotificationFeed) {
    let feed = feed.clone();
    transport.on_notification(move |n| feed.push(n));
}
