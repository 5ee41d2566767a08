//! # Pusher Native
//!
//! A unified Pusher channel client over platform-native real-time SDKs
//! (the Android Java client, the iOS Objective-C client and the JavaScript
//! client).
//!
//! The native SDK owns the connection, authentication and reconnection. This
//! crate owns everything above it:
//!
//! - Channel naming (`private-` / `presence-` prefixes, or `type-name`)
//! - Input validation before any native call
//! - Subscription de-duplication per wire channel
//! - Event binding IDs and selective unbinding
//! - Presence rosters
//! - Deferred client events with a bounded, cancellable wait
//!
//! Platform adapters implement [`Transport`]; [`LoopbackTransport`] runs the
//! whole stack in memory.
//!
//! ## Example
//!
//! ```ignore
//! use pusher_native::{CallbackListener, LoopbackTransport, Pusher, PusherOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(LoopbackTransport::new());
//!     let pusher = Pusher::new("app-key", PusherOptions::new().cluster("mt1"), transport.factory())?;
//!
//!     let listener = CallbackListener::new()
//!         .on_event(|event| println!("{} on {}: {}", event.event_name, event.channel, event.data))
//!         .build();
//!     let binding = pusher.subscribe("my-channel", "my-event", listener).await?;
//!
//!     pusher.unsubscribe("my-channel", Some(&[binding]))?;
//!     Ok(())
//! }
//! ```

pub mod channels;
pub mod connection;
pub mod events;
pub mod transports;
pub mod utils;
pub mod validation;

mod error;
mod options;
mod pusher;

// Re-exports
pub use channels::{ChannelName, ChannelNaming, ChannelType, Member, Members};
pub use connection::ConnectionState;
pub use error::{PusherError, Result};
pub use events::{BindingId, CallbackListener, ChannelEvent, ChannelListener, EventBinding};
pub use options::{Config, Platform, PusherOptions};
pub use pusher::Pusher;
pub use transports::{
    LoopbackTransport, NativeChannel, NativeEvent, NativeMember, Transport, TransportFactory,
};
