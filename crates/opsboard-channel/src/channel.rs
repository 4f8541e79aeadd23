//! The channel handle the application holds.
//!
//! A [`Channel`] starts on the network ([`RealChannel`]) and swaps itself
//! for a [`FallbackEmitter`] when the reconnection policy is exhausted.
//! Handlers registered before the swap keep firing afterwards, so callers
//! never branch on which transport is live.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use opsboard_core::{events, Frame};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::dialer::{Dialer, WsDialer};
use crate::error::ChannelError;
use crate::fallback::FallbackEmitter;
use crate::handlers::{Handler, HandlerRegistry};
use crate::real::{RealChannel, ReconnectPolicy};
use crate::transport::{ChannelState, Transport};

#[derive(Clone)]
enum Link {
    Real(RealChannel),
    Fallback(FallbackEmitter),
}

impl Link {
    fn transport(&self) -> &dyn Transport {
        match self {
            Self::Real(real) => real,
            Self::Fallback(fallback) => fallback,
        }
    }
}

struct Shared {
    endpoint: String,
    handlers: HandlerRegistry,
    link: Mutex<Link>,
    state: Arc<watch::Sender<ChannelState>>,
    fallback_active: AtomicBool,
}

impl Shared {
    fn lock_link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> Link {
        self.lock_link().clone()
    }

    /// Swap in the fallback emitter. Only the first call has any effect.
    fn activate_fallback(&self, reason: &ChannelError, attempts: u32) {
        if self.handlers.is_closed() || self.fallback_active.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!(
            endpoint = %self.endpoint,
            attempts,
            reason = %reason,
            "Notification server unreachable, switching to local fallback"
        );

        let error = Frame::connect_error(&reason.to_string(), attempts);
        self.handlers.dispatch(events::CONNECT_ERROR, &error.data);

        *self.lock_link() = Link::Fallback(FallbackEmitter::with_handlers(self.handlers.clone()));
        self.handlers.dispatch(events::CONNECT, &Value::Null);
    }
}

impl Drop for Shared {
    /// The last handle is gone: close the channel as `disconnect` would.
    fn drop(&mut self) {
        if self.handlers.is_closed() {
            return;
        }
        self.handlers.close();
        match &*self.link.get_mut().unwrap_or_else(PoisonError::into_inner) {
            Link::Real(real) => real.disconnect(),
            Link::Fallback(fallback) => fallback.disconnect(),
        }
        info!(endpoint = %self.endpoint, "Channel dropped, closed");
    }
}

/// A logical connection to the notification server.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct Channel {
    shared: Arc<Shared>,
}

impl Channel {
    /// Start connecting to `endpoint` in the background.
    ///
    /// Outside a tokio runtime no connection can be made and the channel
    /// starts directly on the fallback emitter.
    pub fn open(endpoint: &str, dialer: Arc<dyn Dialer>, policy: ReconnectPolicy) -> Self {
        let handlers = HandlerRegistry::new();
        let (state, _rx) = watch::channel(ChannelState::Connecting);
        let state = Arc::new(state);
        let (real, task) = RealChannel::new(endpoint, dialer, policy, handlers.clone(), state.clone());

        let shared = Arc::new(Shared {
            endpoint: endpoint.to_string(),
            handlers,
            link: Mutex::new(Link::Real(real)),
            state,
            fallback_active: AtomicBool::new(false),
        });

        if tokio::runtime::Handle::try_current().is_ok() {
            let weak: Weak<Shared> = Arc::downgrade(&shared);
            task.spawn(Box::new(move |reason: &ChannelError, attempts: u32| {
                if let Some(shared) = weak.upgrade() {
                    shared.activate_fallback(reason, attempts);
                }
            }));
        } else {
            let reason = ChannelError::dial(endpoint, "no async runtime");
            shared.activate_fallback(&reason, 0);
            shared.state.send_replace(ChannelState::FailedPermanently);
        }

        info!(endpoint = %endpoint, "Channel opened");
        Self { shared }
    }

    pub fn endpoint(&self) -> &str {
        &self.shared.endpoint
    }

    /// State of the network link.
    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    /// Watch network link state changes.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// Whether the fallback emitter has replaced the network link.
    pub fn is_fallback(&self) -> bool {
        self.shared.fallback_active.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.handlers.is_closed()
    }

    /// Id assigned by the server, while on the network link.
    pub fn peer_id(&self) -> Option<String> {
        match self.shared.current() {
            Link::Real(real) => real.peer_id(),
            Link::Fallback(_) => None,
        }
    }

    /// Whether two handles refer to the same channel.
    pub fn same_channel(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Transport for Channel {
    fn on(&self, event: &str, handler: Handler) {
        self.shared.current().transport().on(event, handler);
    }

    fn emit(&self, event: &str, payload: Value) {
        if self.is_closed() {
            return;
        }
        self.shared.current().transport().emit(event, payload);
    }

    fn disconnect(&self) {
        if self.is_closed() {
            return;
        }
        // Close first so nothing is delivered while the link winds down.
        self.shared.handlers.close();
        match self.shared.current() {
            Link::Real(real) => real.disconnect(),
            Link::Fallback(fallback) => {
                fallback.disconnect();
                self.shared.state.send_replace(ChannelState::Disconnected);
            }
        }
        info!(endpoint = %self.shared.endpoint, "Channel closed");
    }
}

/// Owns the application's single channel.
pub struct ChannelClient {
    dialer: Arc<dyn Dialer>,
    policy: ReconnectPolicy,
    current: Mutex<Option<Channel>>,
}

impl ChannelClient {
    pub fn new() -> Self {
        Self::with_dialer(Arc::new(WsDialer::default()), ReconnectPolicy::default())
    }

    pub fn with_dialer(dialer: Arc<dyn Dialer>, policy: ReconnectPolicy) -> Self {
        Self {
            dialer,
            policy,
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Channel>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live channel, opening one if there is none.
    pub fn connect(&self, endpoint: &str) -> Channel {
        let mut current = self.lock();
        if let Some(channel) = current.as_ref().filter(|c| !c.is_closed()) {
            if channel.endpoint() != endpoint {
                warn!(
                    open = %channel.endpoint(),
                    requested = %endpoint,
                    "Channel already open, reusing it"
                );
            }
            return channel.clone();
        }
        let channel = Channel::open(endpoint, self.dialer.clone(), self.policy);
        *current = Some(channel.clone());
        channel
    }

    pub fn current(&self) -> Option<Channel> {
        self.lock().clone()
    }

    /// Close and forget the channel.
    pub fn disconnect(&self) {
        if let Some(channel) = self.lock().take() {
            channel.disconnect();
        }
    }
}

impl Default for ChannelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialer::{FrameSink, FrameStream};
    use async_trait::async_trait;
    use futures::channel::mpsc as fmpsc;
    use futures::{SinkExt, StreamExt};
    use opsboard_core::Notification;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    struct FailingDialer {
        attempts: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Dialer for FailingDialer {
        async fn dial(&self, endpoint: &str) -> Result<(FrameSink, FrameStream), ChannelError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(ChannelError::dial(endpoint, "connection refused"))
        }
    }

    /// Server side of an in-memory link.
    struct ServerEnd {
        to_client: fmpsc::UnboundedSender<Result<Frame, ChannelError>>,
        from_client: fmpsc::UnboundedReceiver<Frame>,
    }

    struct MemoryDialer {
        accepted: mpsc::UnboundedSender<ServerEnd>,
    }

    #[async_trait]
    impl Dialer for MemoryDialer {
        async fn dial(&self, _endpoint: &str) -> Result<(FrameSink, FrameStream), ChannelError> {
            let (c2s_tx, c2s_rx) = fmpsc::unbounded();
            let (s2c_tx, s2c_rx) = fmpsc::unbounded();
            self.accepted
                .send(ServerEnd {
                    to_client: s2c_tx,
                    from_client: c2s_rx,
                })
                .map_err(|_| ChannelError::Closed)?;
            let sink = c2s_tx.sink_map_err(|e| ChannelError::Transport(e.to_string()));
            Ok((Box::pin(sink), Box::pin(s2c_rx)))
        }
    }

    fn failing() -> (Arc<dyn Dialer>, Arc<AtomicU32>) {
        let attempts = Arc::new(AtomicU32::new(0));
        let dialer = Arc::new(FailingDialer {
            attempts: attempts.clone(),
        });
        (dialer, attempts)
    }

    fn memory() -> (Arc<dyn Dialer>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(MemoryDialer { accepted: tx }), rx)
    }

    fn collect_notifications(channel: &Channel) -> Arc<Mutex<Vec<Notification>>> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        channel.on_notification(move |n| sink.lock().unwrap().push(n));
        received
    }

    fn counter(channel: &Channel, event: &str) -> Arc<AtomicU32> {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        channel.on(event, Arc::new(move |_: &Value| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    async fn wait_for_state(channel: &Channel, wanted: ChannelState) {
        let mut rx = channel.watch_state();
        rx.wait_for(|s| *s == wanted).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_after_exactly_five_attempts() {
        let (dialer, attempts) = failing();
        let started = Instant::now();
        let channel = Channel::open("ws://unreachable/ws", dialer, ReconnectPolicy::default());
        let errors = counter(&channel, events::CONNECT_ERROR);
        let received = collect_notifications(&channel);

        wait_for_state(&channel, ChannelState::FailedPermanently).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert!(channel.is_fallback());
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        // Local echo without any server.
        let n = Notification::new("self-originated");
        channel.emit_notification(&n);
        assert_eq!(*received.lock().unwrap(), vec![n]);

        // No further dials once failed.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_handler_runs_after_disconnect() {
        let (dialer, _attempts) = failing();
        let channel = Channel::open("ws://unreachable/ws", dialer, ReconnectPolicy::default());
        let received = collect_notifications(&channel);
        wait_for_state(&channel, ChannelState::FailedPermanently).await;

        channel.disconnect();
        channel.disconnect();
        channel.emit_notification(&Notification::new("after close"));

        assert!(received.lock().unwrap().is_empty());
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_retry() {
        let (dialer, attempts) = failing();
        let channel = Channel::open("ws://unreachable/ws", dialer, ReconnectPolicy::default());
        let errors = counter(&channel, events::CONNECT_ERROR);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        channel.disconnect();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!channel.is_fallback());
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (dialer, mut accepted) = memory();
        let channel = Channel::open("mem://server", dialer, ReconnectPolicy::default());
        let received = collect_notifications(&channel);

        // Queued while connecting, flushed in order once connected.
        channel.emit("first", Value::from(1));
        channel.emit("second", Value::from(2));

        let mut server = accepted.recv().await.unwrap();
        server.to_client.unbounded_send(Ok(Frame::connect("peer-1"))).unwrap();
        let welcome = Notification::with_id(1, "Welcome to the Dashboard!", "");
        server
            .to_client
            .unbounded_send(Ok(Frame::notification(&welcome)))
            .unwrap();

        assert_eq!(server.from_client.next().await.unwrap().event, "first");
        assert_eq!(server.from_client.next().await.unwrap().event, "second");

        wait_for_state(&channel, ChannelState::Connected).await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while received.lock().unwrap().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(received.lock().unwrap()[0].id, 1);
        assert_eq!(channel.peer_id().as_deref(), Some("peer-1"));
        assert!(!channel.is_fallback());

        channel.disconnect();
        let last = server.from_client.next().await.unwrap();
        assert_eq!(last.event, events::DISCONNECT);
    }

    #[tokio::test]
    async fn test_dropping_last_handle_closes_link() {
        let (dialer, mut accepted) = memory();
        let channel = Channel::open("mem://server", dialer, ReconnectPolicy::default());
        let received = collect_notifications(&channel);
        let mut state = channel.watch_state();
        let copy = channel.clone();

        let mut server = accepted.recv().await.unwrap();
        wait_for_state(&channel, ChannelState::Connected).await;

        // One handle left, the link stays up.
        drop(channel);
        assert_eq!(*state.borrow(), ChannelState::Connected);

        drop(copy);
        state
            .wait_for(|s| *s == ChannelState::Disconnected)
            .await
            .unwrap();
        let last = server.from_client.next().await.unwrap();
        assert_eq!(last.event, events::DISCONNECT);
        assert!(server.from_client.next().await.is_none());

        let _ = server
            .to_client
            .unbounded_send(Ok(Frame::notification(&Notification::new("too late"))));
        tokio::task::yield_now().await;
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_link_reconnects() {
        let (dialer, mut accepted) = memory();
        let channel = Channel::open("mem://server", dialer, ReconnectPolicy::default());
        let disconnects = counter(&channel, events::DISCONNECT);

        let first = accepted.recv().await.unwrap();
        wait_for_state(&channel, ChannelState::Connected).await;
        drop(first);

        let mut second = accepted.recv().await.unwrap();
        wait_for_state(&channel, ChannelState::Connected).await;
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);

        channel.emit("hello", Value::Null);
        assert_eq!(second.from_client.next().await.unwrap().event, "hello");
        assert!(!channel.is_fallback());
        channel.disconnect();
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_connect_is_idempotent() {
        let (dialer, attempts) = failing();
        let client = ChannelClient::with_dialer(dialer, ReconnectPolicy::default());

        let a = client.connect("ws://unreachable/ws");
        let b = client.connect("ws://unreachable/ws");
        assert!(a.same_channel(&b));

        wait_for_state(&a, ChannelState::FailedPermanently).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 5);

        client.disconnect();
        assert!(a.is_closed());
        assert!(client.current().is_none());

        let c = client.connect("ws://unreachable/ws");
        assert!(!c.same_channel(&a));
        client.disconnect();
    }

    #[test]
    fn test_open_outside_runtime_starts_on_fallback() {
        let (dialer, attempts) = failing();
        let channel = Channel::open("ws://unreachable/ws", dialer, ReconnectPolicy::default());
        assert!(channel.is_fallback());
        assert_eq!(channel.state(), ChannelState::FailedPermanently);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);

        let received = collect_notifications(&channel);
        channel.emit_notification(&Notification::new("offline"));
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
