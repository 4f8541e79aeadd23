//! Application state.

use opsboard_core::provider::Providers;

use crate::hub::BroadcastHub;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: BroadcastHub,
    pub providers: Providers,
}

impl AppState {
    pub fn new(hub: BroadcastHub, providers: Providers) -> Self {
        Self { hub, providers }
    }
}
