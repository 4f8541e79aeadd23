//! Channel error types.

use opsboard_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Could not connect to {endpoint}: {reason}")]
    Dial { endpoint: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel closed")]
    Closed,

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

impl ChannelError {
    pub fn dial(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dial {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
