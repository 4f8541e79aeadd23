//! Real-time notifications: model, catalogs and the client feed.

pub mod catalog;
pub mod feed;
pub mod model;

use crate::error::{CoreError, CoreResult};
use crate::wire::events;
use model::Notification;
use serde_json::Value;

pub use catalog::{MessageCatalog, WELCOME_MESSAGE};
pub use feed::{FeedSnapshot, FeedState, NotificationFeed, DECAY_PERIOD, FEED_CAPACITY};

/// Decode a `notification` event payload.
///
/// Objects decode leniently, with defaults for missing or unusable fields;
/// anything that is not an object is rejected as malformed.
pub fn from_payload(payload: &Value) -> CoreResult<Notification> {
    if !payload.is_object() {
        return Err(CoreError::malformed(
            events::NOTIFICATION,
            format!("expected an object, got {}", payload),
        ));
    }
    serde_json::from_value(payload.clone())
        .map_err(|e| CoreError::malformed(events::NOTIFICATION, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload_accepts_partial_objects() {
        let n = from_payload(&json!({"id": 3, "message": "hi"})).unwrap();
        assert_eq!(n.id, 3);
        assert_eq!(n.message, "hi");
    }

    #[test]
    fn test_from_payload_rejects_non_objects() {
        let err = from_payload(&json!("just text")).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { .. }));
    }

    #[test]
    fn test_from_payload_keeps_unparseable_timestamp() {
        let n = from_payload(&json!({"id": 1, "message": "hello", "timestamp": "10:00 today"})).unwrap();
        assert_eq!(n.id, 1);
        assert_eq!(n.message, "hello");
        assert_eq!(n.timestamp, "10:00 today");
    }

    #[test]
    fn test_from_payload_treats_null_as_default() {
        let n = from_payload(&json!({"id": null, "message": "hi", "timestamp": null})).unwrap();
        assert_eq!(n.id, 0);
        assert_eq!(n.message, "hi");
        assert!(n.timestamp.is_empty());

        let n = from_payload(&json!({"message": null})).unwrap();
        assert!(n.message.is_empty());
    }

    #[test]
    fn test_from_payload_accepts_float_and_string_ids() {
        let n = from_payload(&json!({"id": 1716000000000.0_f64, "message": "js"})).unwrap();
        assert_eq!(n.id, 1_716_000_000_000);

        assert_eq!(from_payload(&json!({"id": "42"})).unwrap().id, 42);
        assert_eq!(from_payload(&json!({"id": "not a number"})).unwrap().id, 0);
    }

    #[test]
    fn test_from_payload_round_trips_timestamp_unchanged() {
        let payload = json!({"id": 7, "message": "m", "timestamp": "2024-05-01T10:00:00+02:00"});
        let n = from_payload(&payload).unwrap();
        assert_eq!(serde_json::to_value(&n).unwrap(), payload);
    }
}
