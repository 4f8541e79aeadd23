//! Establishing the network link.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use opsboard_core::Frame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::error::ChannelError;

/// Outgoing half of a link.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = ChannelError> + Send>>;

/// Incoming half of a link.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, ChannelError>> + Send>>;

/// Opens one link to an endpoint.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, endpoint: &str) -> Result<(FrameSink, FrameStream), ChannelError>;
}

/// WebSocket dialer exchanging JSON text frames.
#[derive(Debug, Clone)]
pub struct WsDialer {
    connect_timeout: Duration,
}

impl WsDialer {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsDialer {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, endpoint: &str) -> Result<(FrameSink, FrameStream), ChannelError> {
        let (socket, _response) = tokio::time::timeout(self.connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| ChannelError::dial(endpoint, "connection timed out"))?
            .map_err(|e| ChannelError::dial(endpoint, e.to_string()))?;
        debug!(endpoint = %endpoint, "WebSocket established");

        let (sink, stream) = socket.split();

        let sink = sink
            .sink_map_err(|e| ChannelError::Transport(e.to_string()))
            .with(|frame: Frame| {
                future::ready(
                    frame
                        .encode()
                        .map(Message::text)
                        .map_err(ChannelError::from),
                )
            });

        let stream = stream.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => match Frame::decode(text.as_str()) {
                    Ok(frame) => Some(Ok(frame)),
                    Err(e) => {
                        warn!(error = %e, "Dropping undecodable frame");
                        None
                    }
                },
                Ok(_) => None,
                Err(e) => Some(Err(ChannelError::Transport(e.to_string()))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// Turn a server base URL into its channel endpoint.
///
/// `http://host:3001` becomes `ws://host:3001/ws`; URLs that already use a
/// `ws` scheme are kept as they are.
pub fn ws_endpoint(url: &str) -> String {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        return url.to_string();
    }
    let url = url.trim_end_matches('/');
    let rest = url
        .strip_prefix("https://")
        .map(|rest| format!("wss://{}", rest))
        .or_else(|| url.strip_prefix("http://").map(|rest| format!("ws://{}", rest)))
        .unwrap_or_else(|| format!("ws://{}", url));
    format!("{}/ws", rest)
}
