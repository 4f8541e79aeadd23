//! Server broadcast hub.
//!
//! Keeps the registry of connected peers. Each peer owns an unbounded
//! outbound queue drained by its own socket writer, so one slow or dead
//! peer never holds up delivery to the others. Each peer also owns a
//! periodic task that broadcasts a random catalog notification.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use opsboard_core::notification::{MessageCatalog, WELCOME_MESSAGE};
use opsboard_core::{Frame, Notification};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Hub settings.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Period of each peer's synthesized broadcast.
    pub tick_interval: Duration,
    pub welcome_message: String,
    pub catalog: MessageCatalog,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            welcome_message: WELCOME_MESSAGE.to_string(),
            catalog: MessageCatalog::server(),
        }
    }
}

/// Opaque id assigned to each connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct PeerEntry {
    outbound: mpsc::UnboundedSender<Frame>,
    ticker: CancellationToken,
}

struct HubInner {
    peers: Mutex<HashMap<PeerId, PeerEntry>>,
    config: HubConfig,
    shutdown: CancellationToken,
}

/// Fan-out point for every connected channel.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                peers: Mutex::new(HashMap::new()),
                config,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Register a peer, queue its welcome and start its periodic task.
    ///
    /// Returns the peer id and the queue its socket writer must drain.
    pub async fn register(&self) -> (PeerId, mpsc::UnboundedReceiver<Frame>) {
        let peer_id = PeerId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = self.inner.shutdown.child_token();

        let total = {
            let mut peers = self.inner.peers.lock().await;
            peers.insert(
                peer_id,
                PeerEntry {
                    outbound: tx.clone(),
                    ticker: ticker.clone(),
                },
            );
            peers.len()
        };
        info!(peer_id = %peer_id, total, "Peer connected");

        let welcome = Notification::new(self.inner.config.welcome_message.clone());
        let _ = tx.send(Frame::connect(&peer_id.to_string()));
        let _ = tx.send(Frame::notification(&welcome));

        self.spawn_ticker(peer_id, ticker);
        (peer_id, rx)
    }

    /// Remove a peer and cancel its periodic task in one step.
    pub async fn unregister(&self, peer_id: &PeerId) -> bool {
        let mut peers = self.inner.peers.lock().await;
        match peers.remove(peer_id) {
            Some(entry) => {
                entry.ticker.cancel();
                info!(peer_id = %peer_id, remaining = peers.len(), "Peer disconnected");
                true
            }
            None => false,
        }
    }

    /// Send a notification to every registered peer.
    ///
    /// Returns how many peers accepted it.
    pub async fn broadcast(&self, notification: &Notification) -> usize {
        self.broadcast_frame(Frame::notification(notification)).await
    }

    /// Re-broadcast a client-originated notification payload unchanged,
    /// sender included.
    pub async fn relay(&self, from: &PeerId, payload: Value) -> usize {
        debug!(peer_id = %from, payload = %payload, "Relaying client notification");
        self.broadcast_frame(Frame::new(opsboard_core::events::NOTIFICATION, payload))
            .await
    }

    async fn broadcast_frame(&self, frame: Frame) -> usize {
        let peers = self.inner.peers.lock().await;
        fan_out(&peers, frame)
    }

    pub async fn peer_count(&self) -> usize {
        self.inner.peers.lock().await.len()
    }

    pub async fn contains(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.lock().await.contains_key(peer_id)
    }

    /// Cancel every periodic task and drop all peers.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut peers = self.inner.peers.lock().await;
        let count = peers.len();
        peers.clear();
        info!(peers = count, "Hub shut down");
    }

    fn spawn_ticker(&self, peer_id: PeerId, token: CancellationToken) {
        let period = self.inner.config.tick_interval;
        let hub: Weak<HubInner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = hub.upgrade() else { break };
                        // Checked under the registry lock, so a removed peer never fires.
                        let peers = inner.peers.lock().await;
                        if token.is_cancelled() || !peers.contains_key(&peer_id) {
                            break;
                        }
                        if let Some(notification) = inner.config.catalog.random_notification() {
                            debug!(peer_id = %peer_id, message = %notification.message, "Periodic notification");
                            fan_out(&peers, Frame::notification(&notification));
                        }
                    }
                }
            }
            debug!(peer_id = %peer_id, "Periodic task stopped");
        });
    }
}

/// Queue `frame` for every peer. Returns how many accepted it.
fn fan_out(peers: &HashMap<PeerId, PeerEntry>, frame: Frame) -> usize {
    let mut delivered = 0;
    for (peer_id, entry) in peers.iter() {
        match entry.outbound.send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(_) => warn!(peer_id = %peer_id, "Peer writer gone, skipping"),
        }
    }
    debug!(event = %frame.event, delivered, total = peers.len(), "Broadcast");
    delivered
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
