//! Notification domain models.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};

/// Last id handed out by [`next_id`].
static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// A real-time notification.
///
/// Decoding is lenient: a missing, `null` or unusable field falls back to
/// its default (id `0`, empty text) so a partial payload still renders.
/// The timestamp is kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_text")]
    pub message: String,
    /// ISO-8601 creation time, as minted by the sender.
    #[serde(deserialize_with = "lenient_text")]
    pub timestamp: String,
}

impl Notification {
    /// Mint a notification stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: next_id(now.timestamp_millis()),
            message: message.into(),
            timestamp: format_timestamp(now),
        }
    }

    /// Build a notification with explicit fields.
    pub fn with_id(id: i64, message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }

    /// The timestamp, when it is valid RFC 3339.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Local wall-clock time for display, e.g. `14:03:27`.
    ///
    /// Timestamps that do not parse are shown as received.
    pub fn display_time(&self) -> String {
        match self.parsed_timestamp() {
            Some(ts) => ts.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
            None => self.timestamp.clone(),
        }
    }
}

/// Format a UTC time the way notifications carry it, e.g.
/// `2024-05-01T10:00:00.000Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    };
    Ok(id)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(text)
}

/// Millisecond-derived id, strictly increasing within the process.
pub fn next_id(now_millis: i64) -> i64 {
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now_millis.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let a = next_id(1_000);
        let b = next_id(1_000);
        let c = next_id(1_000);
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn test_new_notifications_have_unique_ids() {
        let first = Notification::new("one");
        let second = Notification::new("two");
        assert!(second.id > first.id);
        assert_eq!(first.message, "one");
    }

    #[test]
    fn test_minted_timestamp_is_iso_millis() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(ts), "2024-05-01T10:00:00.000Z");

        let n = Notification::new("fresh");
        assert!(n.parsed_timestamp().is_some());
    }

    #[test]
    fn test_timestamp_is_kept_verbatim() {
        let n = Notification::with_id(1, "Welcome to the Dashboard!", "2024-05-01T10:00:00Z");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["message"], "Welcome to the Dashboard!");
        assert_eq!(json["timestamp"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_display_time_falls_back_to_raw_text() {
        let n = Notification::with_id(1, "hello", "10:00 today");
        assert!(n.parsed_timestamp().is_none());
        assert_eq!(n.display_time(), "10:00 today");
    }

    #[test]
    fn test_missing_fields_render_as_defaults() {
        let n: Notification = serde_json::from_str(r#"{"message": "partial"}"#).unwrap();
        assert_eq!(n.id, 0);
        assert_eq!(n.message, "partial");
        assert!(n.timestamp.is_empty());

        let empty: Notification = serde_json::from_str("{}").unwrap();
        assert!(empty.message.is_empty());
    }
}
