//! Client-side notification feed.
//!
//! Keeps a bounded, newest-first history of received notifications and an
//! unread counter that decays back to zero after a quiet period.
//!
//! [`FeedState`] is the pure state machine; [`NotificationFeed`] wraps it
//! with the decay timer and publishes [`FeedSnapshot`]s on a watch channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::model::Notification;

/// Number of notifications kept in the history.
pub const FEED_CAPACITY: usize = 5;

/// Quiet period after the last arrival before unread resets to zero.
pub const DECAY_PERIOD: Duration = Duration::from_secs(5);

/// Whether a decay timer is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayState {
    Idle,
    AwaitingDecay { generation: u64 },
}

/// History plus unread counter.
#[derive(Debug, Clone)]
pub struct FeedState {
    history: VecDeque<Notification>,
    capacity: usize,
    unread: usize,
    decay: DecayState,
    generation: u64,
}

impl FeedState {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            unread: 0,
            decay: DecayState::Idle,
            generation: 0,
        }
    }

    /// Record an arrival and arm a new decay generation.
    ///
    /// Returns the generation the caller must pass to [`Self::decay_elapsed`].
    pub fn arrive(&mut self, notification: Notification) -> u64 {
        self.history.push_front(notification);
        self.history.truncate(self.capacity);
        self.unread = self.history.len();
        self.generation += 1;
        self.decay = DecayState::AwaitingDecay {
            generation: self.generation,
        };
        self.generation
    }

    /// Explicit acknowledgment. History is left untouched.
    pub fn mark_all_read(&mut self) {
        self.unread = 0;
        self.decay = DecayState::Idle;
    }

    /// Apply a decay firing. Stale generations are ignored.
    pub fn decay_elapsed(&mut self, generation: u64) -> bool {
        match self.decay {
            DecayState::AwaitingDecay { generation: pending } if pending == generation => {
                self.unread = 0;
                self.decay = DecayState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Newest first.
    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn decay_state(&self) -> DecayState {
        self.decay
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            history: self.history.iter().cloned().collect(),
            unread: self.unread,
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(FEED_CAPACITY)
    }
}

/// Read-only view handed to presentational code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedSnapshot {
    pub history: Vec<Notification>,
    pub unread: usize,
}

struct FeedCore {
    state: FeedState,
    decay_task: Option<JoinHandle<()>>,
}

struct FeedInner {
    core: Mutex<FeedCore>,
    snapshots: watch::Sender<FeedSnapshot>,
    decay_period: Duration,
}

impl FeedInner {
    fn lock(&self) -> MutexGuard<'_, FeedCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, core: &FeedCore) {
        self.snapshots.send_replace(core.state.snapshot());
    }
}

/// Shared handle to a notification feed.
#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<FeedInner>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::with_settings(FEED_CAPACITY, DECAY_PERIOD)
    }

    pub fn with_settings(capacity: usize, decay_period: Duration) -> Self {
        let (snapshots, _rx) = watch::channel(FeedSnapshot::default());
        Self {
            inner: Arc::new(FeedInner {
                core: Mutex::new(FeedCore {
                    state: FeedState::new(capacity),
                    decay_task: None,
                }),
                snapshots,
                decay_period,
            }),
        }
    }

    /// Record an arrival and restart the decay timer (last arrival wins).
    pub fn push(&self, notification: Notification) {
        let mut core = self.inner.lock();
        debug!(id = notification.id, "Notification arrived in feed");
        let generation = core.state.arrive(notification);

        if let Some(task) = core.decay_task.take() {
            task.abort();
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(&self.inner);
                let period = self.inner.decay_period;
                core.decay_task = Some(handle.spawn(async move {
                    tokio::time::sleep(period).await;
                    if let Some(inner) = weak.upgrade() {
                        let mut core = inner.lock();
                        if core.state.decay_elapsed(generation) {
                            debug!(generation, "Unread counter decayed");
                            core.decay_task = None;
                            inner.publish(&core);
                        }
                    }
                }));
            }
            Err(_) => warn!("No async runtime available, unread counter will not decay"),
        }

        self.inner.publish(&core);
    }

    /// Reset the unread counter and cancel any pending decay.
    pub fn mark_all_read(&self) {
        let mut core = self.inner.lock();
        if let Some(task) = core.decay_task.take() {
            task.abort();
        }
        core.state.mark_all_read();
        self.inner.publish(&core);
    }

    pub fn history(&self) -> Vec<Notification> {
        self.inner.lock().state.history().cloned().collect()
    }

    pub fn unread(&self) -> usize {
        self.inner.lock().state.unread()
    }

    pub fn decay_state(&self) -> DecayState {
        self.inner.lock().state.decay_state()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.lock().state.snapshot()
    }

    /// Receive a fresh snapshot every time the feed changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.inner.snapshots.subscribe()
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FeedInner {
    fn drop(&mut self) {
        if let Some(task) = self.lock().decay_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: i64) -> Notification {
        Notification::with_id(id, format!("message {}", id), "")
    }

    #[test]
    fn test_history_is_bounded_and_newest_first() {
        let mut state = FeedState::default();
        for id in 1..=6 {
            state.arrive(note(id));
            assert_eq!(state.len(), (id as usize).min(FEED_CAPACITY));
            assert_eq!(state.unread(), state.len());
        }
        let ids: Vec<i64> = state.history().map(|n| n.id).collect();
        assert_eq!(ids, vec![6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_mark_all_read_keeps_history() {
        let mut state = FeedState::default();
        let generation = state.arrive(note(1));
        state.arrive(note(2));
        state.mark_all_read();
        assert_eq!(state.unread(), 0);
        assert_eq!(state.len(), 2);
        assert_eq!(state.decay_state(), DecayState::Idle);
        assert!(!state.decay_elapsed(generation));
    }

    #[test]
    fn test_stale_decay_is_ignored() {
        let mut state = FeedState::default();
        let first = state.arrive(note(1));
        let second = state.arrive(note(2));
        assert!(!state.decay_elapsed(first));
        assert_eq!(state.unread(), 2);
        assert!(state.decay_elapsed(second));
        assert_eq!(state.unread(), 0);
        assert_eq!(state.decay_state(), DecayState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_arrival() {
        let feed = NotificationFeed::new();
        feed.push(Notification::with_id(1, "Welcome to the Dashboard!", ""));

        let history = feed.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 1);
        assert_eq!(feed.unread(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_decays_after_quiet_period() {
        let feed = NotificationFeed::new();
        feed.push(note(1));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(feed.unread(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(feed.unread(), 0);
        assert_eq!(feed.history().len(), 1);
        assert_eq!(feed.decay_state(), DecayState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_arrival_restarts_decay() {
        let feed = NotificationFeed::new();
        feed.push(note(1));

        tokio::time::sleep(Duration::from_secs(4)).await;
        feed.push(note(2));

        // The first timer would have fired at 5s.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(feed.unread(), 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(feed.unread(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acknowledge_cancels_decay() {
        let feed = NotificationFeed::new();
        feed.push(note(1));
        feed.mark_all_read();
        assert_eq!(feed.unread(), 0);
        assert_eq!(feed.decay_state(), DecayState::Idle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.unread(), 0);
        assert_eq!(feed.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_snapshots() {
        let feed = NotificationFeed::new();
        let mut rx = feed.subscribe();

        feed.push(note(7));
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.unread, 1);
        assert_eq!(snapshot.history[0].id, 7);
    }
}
