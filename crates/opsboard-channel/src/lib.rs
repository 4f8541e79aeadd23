//! Opsboard Channel
//!
//! Client side of the notification channel: a WebSocket transport with
//! bounded reconnection and an in-process fallback that keeps the same
//! publish/subscribe surface.

pub mod channel;
pub mod dialer;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod real;
pub mod synth;
pub mod transport;

pub use channel::{Channel, ChannelClient};
pub use dialer::{ws_endpoint, Dialer, WsDialer};
pub use error::{ChannelError, ChannelResult};
pub use fallback::FallbackEmitter;
pub use handlers::{Handler, HandlerRegistry};
pub use real::{RealChannel, ReconnectPolicy};
pub use synth::Synthesizer;
pub use transport::{attach_feed, ChannelState, Transport};
