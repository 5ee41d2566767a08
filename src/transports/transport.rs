//! Native transport boundary.
//!
//! Every native SDK (the Android Java client, the iOS Objective-C client,
//! the JavaScript client) is reached through these traits. Delegates are
//! invoked from the transport's own dispatch loop, never re-entrantly from
//! inside the call that registered them.

use std::sync::Arc;

use crate::connection::ConnectionState;
use crate::error::Result;
use crate::options::Config;

/// Opaque identifier for an event binding held by a native channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeBindingId(pub u64);

/// An event as the native SDK reports it; `data` is wire JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEvent {
    pub channel: String,
    pub event_name: String,
    pub data: String,
}

impl NativeEvent {
    pub fn new(
        channel: impl Into<String>,
        event_name: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            event_name: event_name.into(),
            data: data.into(),
        }
    }
}

/// A presence member as the native SDK reports it; `info` is wire JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMember {
    pub id: String,
    pub info: String,
}

impl NativeMember {
    pub fn new(id: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            info: info.into(),
        }
    }
}

/// Receives events bound on a native channel
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &NativeEvent);
}

/// Connection callback surface
pub trait ConnectionDelegate: Send + Sync {
    /// Called whenever the connection state changes
    fn on_state_change(&self, previous: ConnectionState, current: ConnectionState);

    /// Called when the transport reports a connection error
    fn on_error(&self, message: &str, code: Option<&str>);
}

/// Callback surface for public and private channel subscriptions
pub trait ChannelDelegate: Send + Sync {
    fn on_subscription_succeeded(&self, channel: Arc<dyn NativeChannel>);

    fn on_subscription_failed(&self, message: &str);

    /// Private channels only. Defaults to a plain subscription failure.
    fn on_authentication_failure(&self, message: &str) {
        self.on_subscription_failed(message);
    }
}

/// Callback surface for presence channel subscriptions
pub trait PresenceDelegate: Send + Sync {
    /// Subscription succeeded with the initial member list
    fn on_subscription_succeeded(&self, channel: Arc<dyn NativeChannel>, members: Vec<NativeMember>);

    fn on_subscription_failed(&self, message: &str);

    fn on_authentication_failure(&self, message: &str) {
        self.on_subscription_failed(message);
    }

    fn on_member_added(&self, member: &NativeMember);

    fn on_member_removed(&self, member: &NativeMember);
}

/// A channel handle owned by the native SDK
pub trait NativeChannel: Send + Sync {
    /// Wire name of the channel
    fn name(&self) -> String;

    /// Whether the native subscription has succeeded
    fn is_subscribed(&self) -> bool;

    /// Bind a sink to an event name
    fn bind(&self, event_name: &str, sink: Arc<dyn EventSink>) -> NativeBindingId;

    /// Remove one binding
    fn unbind(&self, event_name: &str, binding: NativeBindingId);

    /// Send a client event; `data` is JSON text
    fn trigger(&self, event_name: &str, data: &str) -> Result<()>;
}

/// A native real-time SDK, one entry point per channel type
pub trait Transport: Send + Sync {
    /// Start connecting; progress is reported to the delegate
    fn connect(&self, delegate: Arc<dyn ConnectionDelegate>);

    /// Request disconnection without waiting for acknowledgement
    fn disconnect(&self);

    fn subscribe_public(
        &self,
        wire_name: &str,
        delegate: Arc<dyn ChannelDelegate>,
    ) -> Arc<dyn NativeChannel>;

    fn subscribe_private(
        &self,
        wire_name: &str,
        delegate: Arc<dyn ChannelDelegate>,
    ) -> Arc<dyn NativeChannel>;

    fn subscribe_presence(
        &self,
        wire_name: &str,
        delegate: Arc<dyn PresenceDelegate>,
    ) -> Arc<dyn NativeChannel>;

    /// Tear down the native subscription for a wire name
    fn unsubscribe(&self, wire_name: &str);
}

/// Builds the native transport once the app key and options are valid
pub trait TransportFactory {
    fn create(&self, app_key: &str, config: &Config) -> Result<Arc<dyn Transport>>;
}

impl<F> TransportFactory for F
where
    F: Fn(&str, &Config) -> Result<Arc<dyn Transport>>,
{
    fn create(&self, app_key: &str, config: &Config) -> Result<Arc<dyn Transport>> {
        self(app_key, config)
    }
}
