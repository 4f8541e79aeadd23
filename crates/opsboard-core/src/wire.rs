//! Channel wire format.
//!
//! Every message on the channel is a JSON text frame of the form
//! `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::notification::model::Notification;

/// Event names understood on the channel.
pub mod events {
    /// Channel established. Payload: `{ "peer_id": ... }`.
    pub const CONNECT: &str = "connect";
    /// A notification. Payload: `{ id, message, timestamp }`.
    pub const NOTIFICATION: &str = "notification";
    /// Channel closing.
    pub const DISCONNECT: &str = "disconnect";
    /// Connection attempts exhausted.
    pub const CONNECT_ERROR: &str = "connect_error";
}

/// A single channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn notification(notification: &Notification) -> Self {
        Self::new(
            events::NOTIFICATION,
            serde_json::to_value(notification).unwrap_or(Value::Null),
        )
    }

    pub fn connect(peer_id: &str) -> Self {
        Self::new(events::CONNECT, serde_json::json!({ "peer_id": peer_id }))
    }

    pub fn disconnect() -> Self {
        Self::new(events::DISCONNECT, Value::Null)
    }

    pub fn connect_error(message: &str, attempts: u32) -> Self {
        Self::new(
            events::CONNECT_ERROR,
            serde_json::json!({ "message": message, "attempts": attempts }),
        )
    }

    pub fn is(&self, event: &str) -> bool {
        self.event == event
    }

    /// Parse a text frame.
    pub fn decode(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::malformed("<frame>", e.to_string()))
    }

    /// Serialize to a text frame.
    pub fn encode(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_notification_frame() {
        let frame = Frame::decode(
            r#"{"event":"notification","data":{"id":1,"message":"hi","timestamp":"2024-05-01T10:00:00Z"}}"#,
        )
        .unwrap();
        assert!(frame.is(events::NOTIFICATION));
        assert_eq!(frame.data["message"], "hi");
    }

    #[test]
    fn test_decode_without_data_defaults_to_null() {
        let frame = Frame::decode(r#"{"event":"disconnect"}"#).unwrap();
        assert_eq!(frame, Frame::disconnect());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Frame::decode("not json").is_err());
        assert!(Frame::decode(r#"{"data": 1}"#).is_err());
    }

    #[test]
    fn test_connect_frame_carries_peer_id() {
        let frame = Frame::connect("abc");
        assert_eq!(frame.data, json!({ "peer_id": "abc" }));
        let text = frame.encode().unwrap();
        assert!(text.contains(r#""event":"connect""#));
    }
}
