//! Event name to handler list mapping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

/// Callback invoked with an event payload.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct Registry {
    handlers: Mutex<HashMap<String, Vec<Handler>>>,
    closed: AtomicBool,
}

/// Shared, ordered handler lists keyed by event name.
///
/// Handlers are invoked outside the lock, so a handler may register more
/// handlers or emit on the channel that owns the registry.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Registry>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Handler>>> {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a handler for `event`. Ignored once the registry is closed.
    pub fn register(&self, event: &str, handler: Handler) {
        if self.is_closed() {
            return;
        }
        self.lock().entry(event.to_string()).or_default().push(handler);
    }

    /// Invoke every handler of `event` in registration order.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let handlers = match self.lock().get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut invoked = 0;
        for handler in handlers {
            if self.is_closed() {
                break;
            }
            handler(payload);
            invoked += 1;
        }
        invoked
    }

    /// Drop every handler. The registry stays usable.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop every handler and refuse further registrations and dispatches.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn count(&self, event: &str) -> usize {
        self.lock().get(event).map(Vec::len).unwrap_or(0)
    }
}
