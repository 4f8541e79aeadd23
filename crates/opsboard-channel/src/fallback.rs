//! In-process stand-in for the network transport.
//!
//! `emit` invokes the locally registered handlers synchronously, so a client
//! that cannot reach the server still sees its own notifications.

use serde_json::Value;
use tracing::debug;

use crate::handlers::{Handler, HandlerRegistry};
use crate::transport::Transport;

#[derive(Clone, Default)]
pub struct FallbackEmitter {
    handlers: HandlerRegistry,
}

impl FallbackEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over handlers already registered on another transport.
    pub fn with_handlers(handlers: HandlerRegistry) -> Self {
        Self { handlers }
    }
}

impl Transport for FallbackEmitter {
    fn on(&self, event: &str, handler: Handler) {
        self.handlers.register(event, handler);
    }

    fn emit(&self, event: &str, payload: Value) {
        let invoked = self.handlers.dispatch(event, &payload);
        debug!(event = %event, invoked, "Fallback emit");
    }

    fn disconnect(&self) {
        self.handlers.clear();
        debug!("Fallback emitter disconnected");
    }
}
