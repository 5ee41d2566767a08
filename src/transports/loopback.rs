//! In-process transport.
//!
//! `LoopbackTransport` implements [`Transport`] in memory. It records every
//! native request and exposes driver methods that play the remote side:
//! completing the connection, accepting or refusing subscriptions,
//! publishing events and reporting presence changes. Driver methods invoke
//! delegates synchronously on the calling thread, which acts as the
//! transport's dispatch loop.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::transport::{
    ChannelDelegate, ConnectionDelegate, EventSink, NativeBindingId, NativeChannel, NativeEvent,
    NativeMember, PresenceDelegate, Transport,
};
use crate::channels::ChannelType;
use crate::connection::ConnectionState;
use crate::error::{PusherError, Result};
use crate::options::Config;

/// Delegate registered with a subscription request
#[derive(Clone)]
enum Subscriber {
    Channel(Arc<dyn ChannelDelegate>),
    Presence(Arc<dyn PresenceDelegate>),
}

/// A channel handle held by the loopback transport
pub struct LoopbackChannel {
    name: String,
    subscribed: AtomicBool,
    /// event_name -> bound sinks
    bindings: DashMap<String, Vec<(NativeBindingId, Arc<dyn EventSink>)>>,
    next_binding: AtomicU64,
    /// Client events sent through this handle
    sent: RwLock<Vec<NativeEvent>>,
}

impl LoopbackChannel {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribed: AtomicBool::new(false),
            bindings: DashMap::new(),
            next_binding: AtomicU64::new(1),
            sent: RwLock::new(Vec::new()),
        }
    }

    fn sinks(&self, event_name: &str) -> Vec<Arc<dyn EventSink>> {
        self.bindings
            .get(event_name)
            .map(|entries| entries.iter().map(|(_, sink)| sink.clone()).collect())
            .unwrap_or_default()
    }

    fn binding_count(&self) -> usize {
        self.bindings.iter().map(|entry| entry.len()).sum()
    }
}

impl NativeChannel for LoopbackChannel {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    fn bind(&self, event_name: &str, sink: Arc<dyn EventSink>) -> NativeBindingId {
        let id = NativeBindingId(self.next_binding.fetch_add(1, Ordering::SeqCst));
        self.bindings
            .entry(event_name.to_string())
            .or_default()
            .push((id, sink));
        id
    }

    fn unbind(&self, event_name: &str, binding: NativeBindingId) {
        if let Some(mut entries) = self.bindings.get_mut(event_name) {
            entries.retain(|(id, _)| *id != binding);
        }
    }

    fn trigger(&self, event_name: &str, data: &str) -> Result<()> {
        if !self.is_subscribed() {
            return Err(PusherError::invalid_state(format!(
                "Cannot trigger event {} because channel {} is not subscribed",
                event_name, self.name
            )));
        }

        self.sent
            .write()
            .push(NativeEvent::new(self.name.clone(), event_name, data));
        Ok(())
    }
}

impl std::fmt::Debug for LoopbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackChannel")
            .field("name", &self.name)
            .field("subscribed", &self.is_subscribed())
            .field("bindings", &self.binding_count())
            .finish()
    }
}

/// In-memory transport with a driver API for the remote side
pub struct LoopbackTransport {
    endpoint: RwLock<String>,
    state: RwLock<ConnectionState>,
    connection: RwLock<Option<Arc<dyn ConnectionDelegate>>>,
    channels: DashMap<String, (Arc<LoopbackChannel>, Subscriber)>,
    subscribe_requests: RwLock<Vec<(ChannelType, String)>>,
    unsubscribe_requests: RwLock<Vec<String>>,
    /// Client events of channels that have since been torn down
    archived_sent: RwLock<Vec<NativeEvent>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self {
            endpoint: RwLock::new(String::new()),
            state: RwLock::new(ConnectionState::Initialized),
            connection: RwLock::new(None),
            channels: DashMap::new(),
            subscribe_requests: RwLock::new(Vec::new()),
            unsubscribe_requests: RwLock::new(Vec::new()),
            archived_sent: RwLock::new(Vec::new()),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// A factory handing out this transport to a facade
    pub fn factory(self: &Arc<Self>) -> impl Fn(&str, &Config) -> Result<Arc<dyn Transport>> {
        let transport = self.clone();
        move |_app_key: &str, config: &Config| -> Result<Arc<dyn Transport>> {
            *transport.endpoint.write() = config.ws_url.clone();
            let handle: Arc<dyn Transport> = transport.clone();
            Ok(handle)
        }
    }

    /// URL the facade configured, empty until a factory call
    pub fn endpoint(&self) -> String {
        self.endpoint.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn transition(&self, next: ConnectionState) {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        let delegate = self.connection.read().clone();
        if let Some(delegate) = delegate {
            delegate.on_state_change(previous, next);
        }
    }

    fn subscriber(&self, wire_name: &str) -> Option<(Arc<LoopbackChannel>, Subscriber)> {
        self.channels
            .get(wire_name)
            .map(|entry| (entry.0.clone(), entry.1.clone()))
    }

    fn register(
        &self,
        channel_type: ChannelType,
        wire_name: &str,
        subscriber: Subscriber,
    ) -> Arc<dyn NativeChannel> {
        debug!("Loopback subscribe request for {}", wire_name);
        self.subscribe_requests
            .write()
            .push((channel_type, wire_name.to_string()));

        let channel = Arc::new(LoopbackChannel::new(wire_name));
        self.channels
            .insert(wire_name.to_string(), (channel.clone(), subscriber));
        channel
    }

    fn archive(&self, channel: &LoopbackChannel) {
        channel.subscribed.store(false, Ordering::SeqCst);
        channel.bindings.clear();
        let sent: Vec<_> = channel.sent.write().drain(..).collect();
        self.archived_sent.write().extend(sent);
    }

    // ------------------------------------------------------------------
    // Driver: connection
    // ------------------------------------------------------------------

    /// Report Connecting without completing the connection
    pub fn connecting(&self) {
        self.transition(ConnectionState::Connecting);
    }

    /// Report Connected, passing through Connecting if not already there
    pub fn establish(&self) {
        if self.state() != ConnectionState::Connecting {
            self.transition(ConnectionState::Connecting);
        }
        self.transition(ConnectionState::Connected);
    }

    /// Report a connection error
    pub fn fail(&self, message: &str) {
        let delegate = self.connection.read().clone();
        if let Some(delegate) = delegate {
            delegate.on_error(message, None);
        }
    }

    /// Lose the connection; every channel becomes unsubscribed
    pub fn drop_connection(&self) {
        for entry in self.channels.iter() {
            entry.0.subscribed.store(false, Ordering::SeqCst);
        }
        self.transition(ConnectionState::Unavailable);
    }

    // ------------------------------------------------------------------
    // Driver: subscriptions
    // ------------------------------------------------------------------

    /// Complete a pending subscription. Presence channels get an empty roster.
    pub fn accept(&self, wire_name: &str) -> bool {
        self.accept_presence(wire_name, Vec::new())
    }

    /// Complete a pending subscription with an initial member list
    pub fn accept_presence(&self, wire_name: &str, members: Vec<NativeMember>) -> bool {
        let Some((channel, subscriber)) = self.subscriber(wire_name) else {
            return false;
        };

        channel.subscribed.store(true, Ordering::SeqCst);
        let handle: Arc<dyn NativeChannel> = channel;
        match subscriber {
            Subscriber::Channel(delegate) => delegate.on_subscription_succeeded(handle),
            Subscriber::Presence(delegate) => delegate.on_subscription_succeeded(handle, members),
        }
        true
    }

    /// Refuse a pending subscription
    pub fn reject(&self, wire_name: &str, message: &str) -> bool {
        let Some((_, (channel, subscriber))) = self.channels.remove(wire_name) else {
            return false;
        };

        self.archive(&channel);
        match subscriber {
            Subscriber::Channel(delegate) => delegate.on_subscription_failed(message),
            Subscriber::Presence(delegate) => delegate.on_subscription_failed(message),
        }
        true
    }

    /// Refuse a pending subscription at the authorization step
    pub fn reject_auth(&self, wire_name: &str, message: &str) -> bool {
        let Some((_, (channel, subscriber))) = self.channels.remove(wire_name) else {
            return false;
        };

        self.archive(&channel);
        match subscriber {
            Subscriber::Channel(delegate) => delegate.on_authentication_failure(message),
            Subscriber::Presence(delegate) => delegate.on_authentication_failure(message),
        }
        true
    }

    // ------------------------------------------------------------------
    // Driver: traffic
    // ------------------------------------------------------------------

    /// Deliver an event to every sink bound to it; returns how many were reached
    pub fn publish(&self, wire_name: &str, event_name: &str, data: &str) -> usize {
        let Some((channel, _)) = self.subscriber(wire_name) else {
            return 0;
        };

        let event = NativeEvent::new(wire_name, event_name, data);
        let sinks = channel.sinks(event_name);
        for sink in &sinks {
            sink.on_event(&event);
        }
        sinks.len()
    }

    /// Report a member joining a presence channel
    pub fn member_joined(&self, wire_name: &str, member: NativeMember) -> bool {
        match self.subscriber(wire_name) {
            Some((_, Subscriber::Presence(delegate))) => {
                delegate.on_member_added(&member);
                true
            }
            _ => false,
        }
    }

    /// Report a member leaving a presence channel
    pub fn member_left(&self, wire_name: &str, member: NativeMember) -> bool {
        match self.subscriber(wire_name) {
            Some((_, Subscriber::Presence(delegate))) => {
                delegate.on_member_removed(&member);
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Every subscribe request, in order
    pub fn subscribe_requests(&self) -> Vec<(ChannelType, String)> {
        self.subscribe_requests.read().clone()
    }

    /// Subscribe requests issued for one wire name
    pub fn subscribe_count(&self, wire_name: &str) -> usize {
        self.subscribe_requests
            .read()
            .iter()
            .filter(|(_, name)| name == wire_name)
            .count()
    }

    /// Every unsubscribe request, in order
    pub fn unsubscribe_requests(&self) -> Vec<String> {
        self.unsubscribe_requests.read().clone()
    }

    /// Client events sent on a wire name, including torn-down subscriptions
    pub fn sent_events(&self, wire_name: &str) -> Vec<NativeEvent> {
        let mut events: Vec<NativeEvent> = self
            .archived_sent
            .read()
            .iter()
            .filter(|e| e.channel == wire_name)
            .cloned()
            .collect();
        if let Some((channel, _)) = self.subscriber(wire_name) {
            events.extend(channel.sent.read().iter().cloned());
        }
        events
    }

    /// Native bindings currently held for a wire name
    pub fn binding_count(&self, wire_name: &str) -> usize {
        self.subscriber(wire_name)
            .map(|(channel, _)| channel.binding_count())
            .unwrap_or(0)
    }

    /// Whether a subscription (pending or complete) exists for a wire name
    pub fn has_channel(&self, wire_name: &str) -> bool {
        self.channels.contains_key(wire_name)
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackTransport {
    fn connect(&self, delegate: Arc<dyn ConnectionDelegate>) {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.connection.write() = Some(delegate);
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        for entry in self.channels.iter() {
            entry.0.subscribed.store(false, Ordering::SeqCst);
        }
        self.transition(ConnectionState::Disconnected);
    }

    fn subscribe_public(
        &self,
        wire_name: &str,
        delegate: Arc<dyn ChannelDelegate>,
    ) -> Arc<dyn NativeChannel> {
        self.register(ChannelType::Public, wire_name, Subscriber::Channel(delegate))
    }

    fn subscribe_private(
        &self,
        wire_name: &str,
        delegate: Arc<dyn ChannelDelegate>,
    ) -> Arc<dyn NativeChannel> {
        self.register(ChannelType::Private, wire_name, Subscriber::Channel(delegate))
    }

    fn subscribe_presence(
        &self,
        wire_name: &str,
        delegate: Arc<dyn PresenceDelegate>,
    ) -> Arc<dyn NativeChannel> {
        self.register(ChannelType::Presence, wire_name, Subscriber::Presence(delegate))
    }

    fn unsubscribe(&self, wire_name: &str) {
        debug!("Loopback unsubscribe request for {}", wire_name);
        self.unsubscribe_requests.write().push(wire_name.to_string());
        if let Some((_, (channel, _))) = self.channels.remove(wire_name) {
            self.archive(&channel);
        }
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("endpoint", &self.endpoint())
            .field("state", &self.state())
            .field("channels", &self.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<NativeEvent>>,
        outcomes: Mutex<Vec<String>>,
    }

    impl EventSink for Recorder {
        fn on_event(&self, event: &NativeEvent) {
            self.events.lock().push(event.clone());
        }
    }

    impl ChannelDelegate for Recorder {
        fn on_subscription_succeeded(&self, channel: Arc<dyn NativeChannel>) {
            self.outcomes.lock().push(format!("ok:{}", channel.name()));
        }

        fn on_subscription_failed(&self, message: &str) {
            self.outcomes.lock().push(format!("failed:{}", message));
        }
    }

    #[test]
    fn test_subscribe_accept_and_publish() {
        let transport = LoopbackTransport::new();
        let recorder = Arc::new(Recorder::default());

        let handle = transport.subscribe_private("private-room", recorder.clone());
        assert!(!handle.is_subscribed());
        assert_eq!(transport.subscribe_count("private-room"), 1);

        assert!(transport.accept("private-room"));
        assert!(handle.is_subscribed());
        assert_eq!(*recorder.outcomes.lock(), vec!["ok:private-room".to_string()]);

        let id = handle.bind("move", recorder.clone());
        assert_eq!(transport.publish("private-room", "move", "{}"), 1);
        assert_eq!(transport.publish("private-room", "other", "{}"), 0);

        handle.unbind("move", id);
        assert_eq!(transport.publish("private-room", "move", "{}"), 0);
        assert_eq!(recorder.events.lock().len(), 1);
    }

    #[test]
    fn test_reject_removes_channel() {
        let transport = LoopbackTransport::new();
        let recorder = Arc::new(Recorder::default());

        transport.subscribe_public("news", recorder.clone());
        assert!(transport.reject("news", "Nope"));
        assert!(!transport.has_channel("news"));
        assert!(!transport.reject("news", "Nope"));
        assert_eq!(*recorder.outcomes.lock(), vec!["failed:Nope".to_string()]);
    }

    #[test]
    fn test_trigger_requires_subscription() {
        let transport = LoopbackTransport::new();
        let recorder = Arc::new(Recorder::default());

        let handle = transport.subscribe_private("private-room", recorder);
        assert!(handle.trigger("client-move", "{}").is_err());

        transport.accept("private-room");
        handle.trigger("client-move", "{}").unwrap();

        transport.unsubscribe("private-room");
        let sent = transport.sent_events("private-room");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event_name, "client-move");
    }
}
