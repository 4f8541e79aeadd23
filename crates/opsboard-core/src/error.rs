//! Centralized error types for Opsboard.

use thiserror::Error;

/// Main error type for Opsboard core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Data fetch failed for {source_name}: {reason}")]
    DataFetch { source_name: String, reason: String },

    #[error("Malformed payload for event '{event}': {reason}")]
    MalformedPayload { event: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Opsboard core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a data fetch error.
    pub fn data_fetch(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataFetch {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed payload error.
    pub fn malformed(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            event: event.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from an unreachable or failing data provider.
    pub fn is_data_fetch(&self) -> bool {
        matches!(self, Self::DataFetch { .. } | Self::Http(_))
    }
}
