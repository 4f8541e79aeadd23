//! Client-side notification synthesizer.
//!
//! Periodically emits a random notification through a transport, the way
//! the dashboard produces self-originated notifications.

use std::time::Duration;

use opsboard_core::notification::MessageCatalog;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::transport::Transport;

/// Default period between synthesized notifications.
pub const DEFAULT_SYNTH_PERIOD: Duration = Duration::from_secs(15);

/// Recurring emission bound to a cancellation token. Stops when dropped.
pub struct Synthesizer {
    cancel: CancellationToken,
}

impl Synthesizer {
    /// Emit one random notification from `catalog` every `period`.
    ///
    /// The first emission happens one full period after start.
    pub fn spawn<T>(transport: T, catalog: MessageCatalog, period: Duration) -> Self
    where
        T: Transport + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Some(notification) = catalog.random_notification() {
                            debug!(id = notification.id, message = %notification.message, "Emitting synthesized notification");
                            transport.emit_notification(&notification);
                        }
                    }
                }
            }
        });
        Self { cancel }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Synthesizer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackEmitter;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn test_emits_every_period_until_stopped() {
        let emitter = FallbackEmitter::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        emitter.on_notification(move |n| sink.lock().unwrap().push(n.message));

        let synth = Synthesizer::spawn(emitter.clone(), MessageCatalog::client(), DEFAULT_SYNTH_PERIOD);

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(received.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(17)).await;
        assert_eq!(received.lock().unwrap().len(), 2);

        synth.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;
        let messages = received.lock().unwrap().clone();
        assert_eq!(messages.len(), 2);
        let catalog = MessageCatalog::client();
        assert!(messages.iter().all(|m| catalog.messages().contains(m)));
    }
}
