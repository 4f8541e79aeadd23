//! Network-backed transport with bounded reconnection.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use opsboard_core::{events, Frame};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dialer::{Dialer, FrameSink, FrameStream};
use crate::error::ChannelError;
use crate::handlers::{Handler, HandlerRegistry};
use crate::transport::{ChannelState, Transport};

/// How hard to try before giving up on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Dials per episode, the first one included.
    pub max_attempts: u32,
    /// Pause between two dials of the same episode.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Called once when an episode runs out of attempts.
pub type FailureHook = Box<dyn FnOnce(&ChannelError, u32) + Send>;

/// Handle to a channel backed by a [`Dialer`].
#[derive(Clone)]
pub struct RealChannel {
    endpoint: Arc<str>,
    handlers: HandlerRegistry,
    outbound: mpsc::UnboundedSender<Frame>,
    state: Arc<watch::Sender<ChannelState>>,
    peer_id: Arc<Mutex<Option<String>>>,
    cancel: CancellationToken,
}

/// Background half of a [`RealChannel`], started with [`RealTask::spawn`].
pub struct RealTask {
    channel: RealChannel,
    dialer: Arc<dyn Dialer>,
    policy: ReconnectPolicy,
    outbound: mpsc::UnboundedReceiver<Frame>,
}

impl RealChannel {
    /// Build the handle and its not-yet-running task.
    pub fn new(
        endpoint: &str,
        dialer: Arc<dyn Dialer>,
        policy: ReconnectPolicy,
        handlers: HandlerRegistry,
        state: Arc<watch::Sender<ChannelState>>,
    ) -> (Self, RealTask) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            endpoint: Arc::from(endpoint),
            handlers,
            outbound: tx,
            state,
            peer_id: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
        };
        let task = RealTask {
            channel: channel.clone(),
            dialer,
            policy,
            outbound: rx,
        };
        (channel, task)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Id the server assigned on the latest connection.
    pub fn peer_id(&self) -> Option<String> {
        self.peer_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, state: ChannelState) {
        if self.cancel.is_cancelled() {
            return;
        }
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(endpoint = %self.endpoint, from = %previous, to = %state, "Channel state changed");
        }
    }

    fn deliver(&self, frame: Frame) {
        if frame.is(events::CONNECT) {
            let peer_id = frame.data["peer_id"].as_str().map(str::to_string);
            info!(endpoint = %self.endpoint, peer_id = ?peer_id, "Connected to notification server");
            *self.peer_id.lock().unwrap_or_else(PoisonError::into_inner) = peer_id;
        }
        self.handlers.dispatch(&frame.event, &frame.data);
    }
}

impl Transport for RealChannel {
    fn on(&self, event: &str, handler: Handler) {
        self.handlers.register(event, handler);
    }

    fn emit(&self, event: &str, payload: Value) {
        if self.outbound.send(Frame::new(event, payload)).is_err() {
            debug!(event = %event, "Emit on a finished channel dropped");
        }
    }

    fn disconnect(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.state.send_replace(ChannelState::Disconnected);
        info!(endpoint = %self.endpoint, "Channel disconnected");
    }
}

enum LinkEnd {
    Cancelled,
    Dropped,
}

impl RealTask {
    /// Run the connection loop on the current runtime.
    pub fn spawn(self, on_failure: FailureHook) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(on_failure))
    }

    async fn run(mut self, on_failure: FailureHook) {
        let channel = self.channel.clone();
        loop {
            let (sink, stream) = match self.establish().await {
                Ok(Some(link)) => link,
                Ok(None) => return,
                Err((error, attempts)) => {
                    warn!(
                        endpoint = %channel.endpoint,
                        attempts,
                        error = %error,
                        "Giving up on notification server"
                    );
                    // Queued frames are discarded with the receiver.
                    drop(self.outbound);
                    on_failure(&error, attempts);
                    channel.set_state(ChannelState::FailedPermanently);
                    return;
                }
            };

            channel.set_state(ChannelState::Connected);
            match self.pump(sink, stream).await {
                LinkEnd::Cancelled => return,
                LinkEnd::Dropped => {
                    warn!(endpoint = %channel.endpoint, "Connection lost, reconnecting");
                    channel.set_state(ChannelState::Disconnected);
                    channel.handlers.dispatch(events::DISCONNECT, &Value::Null);
                }
            }
        }
    }

    /// One reconnection episode. `Ok(None)` means the channel was cancelled.
    async fn establish(
        &mut self,
    ) -> Result<Option<(FrameSink, FrameStream)>, (ChannelError, u32)> {
        let channel = &self.channel;
        let mut attempts = 0;
        loop {
            attempts += 1;
            channel.set_state(ChannelState::Connecting);
            debug!(endpoint = %channel.endpoint, attempt = attempts, "Dialing");

            let dialed = tokio::select! {
                _ = channel.cancel.cancelled() => return Ok(None),
                dialed = self.dialer.dial(&channel.endpoint) => dialed,
            };

            let error = match dialed {
                Ok(link) => return Ok(Some(link)),
                Err(e) => e,
            };

            warn!(
                endpoint = %channel.endpoint,
                attempt = attempts,
                max_attempts = self.policy.max_attempts,
                error = %error,
                "Connection attempt failed"
            );
            if attempts >= self.policy.max_attempts {
                return Err((error, attempts));
            }

            tokio::select! {
                _ = channel.cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }
    }

    async fn pump(&mut self, mut sink: FrameSink, mut stream: FrameStream) -> LinkEnd {
        let channel = self.channel.clone();
        loop {
            tokio::select! {
                _ = channel.cancel.cancelled() => {
                    let _ = sink.send(Frame::disconnect()).await;
                    let _ = sink.close().await;
                    return LinkEnd::Cancelled;
                }
                outgoing = self.outbound.recv() => {
                    let Some(frame) = outgoing else {
                        return LinkEnd::Cancelled;
                    };
                    if let Err(e) = sink.send(frame).await {
                        warn!(error = %e, "Send failed");
                        return LinkEnd::Dropped;
                    }
                }
                incoming = stream.next() => match incoming {
                    Some(Ok(frame)) if frame.is(events::DISCONNECT) => return LinkEnd::Dropped,
                    Some(Ok(frame)) => channel.deliver(frame),
                    Some(Err(e)) => {
                        warn!(error = %e, "Receive failed");
                        return LinkEnd::Dropped;
                    }
                    None => return LinkEnd::Dropped,
                },
            }
        }
    }
}
