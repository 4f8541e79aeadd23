//! Fixed message catalogs used to synthesize notifications.

use rand::seq::SliceRandom;

use super::model::Notification;

/// Message sent to a single peer right after it connects.
pub const WELCOME_MESSAGE: &str = "Welcome to the Dashboard!";

/// Messages the server picks from on every periodic tick.
pub const SERVER_MESSAGES: &[&str] = &[
    "Bitcoin price has increased by 5%",
    "Weather alert: Rain expected in London",
    "Ethereum price has dropped by 3%",
    "System update: New features available",
    "Market update: Trading volume increased by 20%",
];

/// Messages a client synthesizes and emits on its own.
pub const CLIENT_MESSAGES: &[&str] = &[
    "Bitcoin price has increased by 5%",
    "Weather alert: Rain expected in your area",
    "Ethereum price has dropped by 3%",
    "New system update available",
];

/// An owned list of messages to draw random notifications from.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: Vec<String>,
}

impl MessageCatalog {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn server() -> Self {
        Self::new(SERVER_MESSAGES.iter().copied())
    }

    pub fn client() -> Self {
        Self::new(CLIENT_MESSAGES.iter().copied())
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Pick a message uniformly at random and mint a notification for it.
    ///
    /// Returns `None` for an empty catalog.
    pub fn random_notification(&self) -> Option<Notification> {
        self.messages
            .choose(&mut rand::thread_rng())
            .map(|message| Notification::new(message.clone()))
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::server()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_notification_comes_from_catalog() {
        let catalog = MessageCatalog::server();
        for _ in 0..20 {
            let n = catalog.random_notification().unwrap();
            assert!(SERVER_MESSAGES.contains(&n.message.as_str()));
        }
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let catalog = MessageCatalog::new(Vec::<String>::new());
        assert!(catalog.is_empty());
        assert!(catalog.random_notification().is_none());
    }

    #[test]
    fn test_client_catalog_differs_from_server() {
        assert_eq!(MessageCatalog::client().messages().len(), 4);
        assert_eq!(MessageCatalog::server().messages().len(), 5);
    }
}
