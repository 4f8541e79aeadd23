//! HTTP notifier for injecting notifications into a running hub.
//!
//! Posts to the server's `/internal/notify` endpoint, which relays the
//! notification to every connected channel.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::notification::model::Notification;

/// Default server URL.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

/// Notifies the hub of new notifications via HTTP.
#[derive(Clone)]
pub struct HubNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl HubNotifier {
    /// Create a new notifier with default settings.
    ///
    /// Uses the `OPSBOARD_URL` environment variable if set,
    /// otherwise defaults to `http://127.0.0.1:3001`.
    pub fn new() -> Self {
        let base_url =
            std::env::var("OPSBOARD_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self::with_url(&base_url)
    }

    /// Create a notifier with a custom base URL.
    pub fn with_url(base_url: &str) -> Self {
        debug!(base_url = %base_url, "HubNotifier initialized");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a notification to be broadcast to all peers.
    pub async fn notify(&self, notification: &Notification) -> CoreResult<()> {
        let url = format!("{}/internal/notify", self.base_url);
        debug!(url = %url, id = notification.id, "Sending notification to hub");

        let response = self
            .client
            .post(&url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, url = %url, "Failed to reach hub (server may not be running)");
                CoreError::Connection(e.to_string())
            })?;

        if response.status().is_success() {
            debug!(id = notification.id, "Notification accepted by hub");
            Ok(())
        } else {
            warn!(status_code = %response.status(), "Hub rejected notification");
            Err(CoreError::Connection(format!(
                "hub responded with {}",
                response.status()
            )))
        }
    }

    /// Mint and send a notification with the given message.
    pub async fn notify_message(&self, message: &str) -> CoreResult<Notification> {
        let notification = Notification::new(message);
        self.notify(&notification).await?;
        Ok(notification)
    }
}

impl Default for HubNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let notifier = HubNotifier::with_url("http://localhost:3001/");
        assert_eq!(notifier.base_url(), "http://localhost:3001");
    }

    #[tokio::test]
    async fn test_unreachable_hub_is_connection_error() {
        let notifier = HubNotifier::with_url("http://127.0.0.1:9");
        let err = notifier.notify_message("hello").await.unwrap_err();
        assert!(matches!(err, CoreError::Connection(_)));
    }
}
