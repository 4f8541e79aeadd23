//! Opsboard Core Library
//!
//! Notification model, wire format, client feed and data providers for the
//! operations dashboard.

pub mod error;
pub mod notification;
pub mod notifier;
pub mod provider;
pub mod wire;

pub use error::{CoreError, CoreResult};
pub use notification::model::Notification;
pub use wire::{events, Frame};
