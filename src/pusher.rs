//! The client facade.

use dashmap::DashMap;
use futures::future::{AbortRegistration, Abortable};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::channels::{ChannelName, ChannelType, Member, Members};
use crate::connection::{ConnectionState, ConnectionTracker};
use crate::error::{PusherError, Result};
use crate::events::{BindingId, BindingRegistry, ChannelEvent, ChannelListener, EventBinding};
use crate::options::{Config, PusherOptions};
use crate::transports::{
    ChannelDelegate, EventSink, NativeChannel, NativeEvent, NativeMember, PresenceDelegate,
    Transport, TransportFactory,
};
use crate::utils::poll_until;
use crate::validation;

/// Prefix the transport expects on client-originated event names
const CLIENT_EVENT_PREFIX: &str = "client-";

/// A `subscribe()` call waiting for its binding ID
struct Waiter {
    event_name: String,
    listener: Arc<dyn ChannelListener>,
    reply: oneshot::Sender<Result<BindingId>>,
}

/// Every subscriber of one wire channel
struct Subscribers {
    /// Calls waiting on the native outcome; `None` once it has arrived
    waiting: Mutex<Option<Vec<Waiter>>>,
    /// Listener of each live binding
    listeners: RwLock<Vec<(BindingId, Arc<dyn ChannelListener>)>>,
}

impl Subscribers {
    fn pending(first: Waiter) -> Self {
        Self {
            waiting: Mutex::new(Some(vec![first])),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Queue a call behind the outstanding native outcome.
    ///
    /// Hands the waiter back when the outcome already arrived.
    fn enqueue(&self, waiter: Waiter) -> Option<Waiter> {
        let mut waiting = self.waiting.lock();
        match waiting.as_mut() {
            Some(queue) => {
                queue.push(waiter);
                None
            }
            None => Some(waiter),
        }
    }

    fn is_pending(&self) -> bool {
        self.waiting.lock().is_some()
    }

    /// Take every queued call; `None` when already settled
    fn settle(&self) -> Option<Vec<Waiter>> {
        self.waiting.lock().take()
    }

    fn listeners(&self) -> Vec<Arc<dyn ChannelListener>> {
        self.listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

/// A native subscription, pending or complete
#[derive(Clone)]
struct ChannelEntry {
    handle: Arc<dyn NativeChannel>,
    subscribers: Arc<Subscribers>,
}

/// State shared between the facade and the delegates it hands out
struct Shared {
    tracker: Arc<ConnectionTracker>,
    /// wire name -> native subscription
    channels: DashMap<String, ChannelEntry>,
    registry: BindingRegistry,
    /// wire name -> presence roster
    rosters: DashMap<String, Arc<Members>>,
}

impl Shared {
    fn entry(&self, wire_name: &str) -> Option<ChannelEntry> {
        self.channels
            .get(wire_name)
            .map(|entry| entry.value().clone())
    }

    fn handle(&self, wire_name: &str) -> Option<Arc<dyn NativeChannel>> {
        self.entry(wire_name).map(|entry| entry.handle)
    }

    fn roster(&self, wire_name: &str) -> Option<Arc<Members>> {
        self.rosters.get(wire_name).map(|r| r.value().clone())
    }

    /// Bind a listener on the native handle and register the binding
    fn bind(
        &self,
        entry: &ChannelEntry,
        channel: &ChannelName,
        event_name: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> BindingId {
        let sink = Arc::new(ListenerSink {
            channel: channel.bare_name().to_string(),
            listener: listener.clone(),
        });
        let native = entry.handle.bind(event_name, sink);
        let id = self.registry.allocate(channel, event_name, native);
        entry.subscribers.listeners.write().push((id, listener));
        id
    }

    /// Answer a subscriber of a subscribed channel.
    ///
    /// Presence listeners get the roster, the others a success callback.
    fn admit(
        &self,
        entry: &ChannelEntry,
        channel: &ChannelName,
        waiter: Waiter,
        members: Option<&[Member]>,
    ) {
        let bare_name = channel.bare_name();
        match members {
            Some(members) => waiter
                .listener
                .on_member_information_received(bare_name, members),
            None => waiter.listener.on_subscription_succeeded(bare_name),
        }

        let id = self.bind(entry, channel, &waiter.event_name, waiter.listener);
        if waiter.reply.send(Ok(id)).is_err() {
            debug!(
                "subscribe() for {} was abandoned, releasing binding {}",
                channel, id
            );
            if let Some(binding) = self.registry.get(id) {
                self.release(&binding);
            }
        }
    }

    /// Drop one binding from the native handle, the listeners and the registry
    fn release(&self, binding: &EventBinding) {
        if let Some(entry) = self.entry(&binding.wire_name) {
            entry.handle.unbind(&binding.event_name, binding.native);
            entry
                .subscribers
                .listeners
                .write()
                .retain(|(id, _)| *id != binding.id);
        }
        self.registry.remove(binding.id);
    }

    /// Forget everything held for a wire name, returning the removed entry
    fn forget(&self, wire_name: &str) -> Option<ChannelEntry> {
        let entry = self.channels.remove(wire_name).map(|(_, entry)| entry);
        self.rosters.remove(wire_name);
        self.registry.remove_all_for_channel(wire_name);
        entry
    }
}

/// Adapts a caller listener to the native event sink interface
struct ListenerSink {
    /// Bare channel name reported to the listener
    channel: String,
    listener: Arc<dyn ChannelListener>,
}

impl EventSink for ListenerSink {
    fn on_event(&self, event: &NativeEvent) {
        let event = ChannelEvent::from_native(self.channel.clone(), event);
        self.listener.on_event(&event);
    }
}

/// Delegate registered with a native subscribe request
struct SubscriptionDelegate {
    shared: Weak<Shared>,
    channel: ChannelName,
    subscribers: Arc<Subscribers>,
}

impl SubscriptionDelegate {
    fn succeed(&self, handle: Arc<dyn NativeChannel>, members: Option<Vec<Member>>) {
        let wire_name = self.channel.wire_name();
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        if !self.subscribers.is_pending() {
            debug!("Ignoring repeated subscription success for {}", wire_name);
            return;
        }

        // Roster first: a subscriber arriving once the queue is settled reads it
        if let Some(ref members) = members {
            let roster = shared
                .rosters
                .entry(wire_name.clone())
                .or_default()
                .value()
                .clone();
            roster.on_subscription(members);
        }

        let Some(waiters) = self.subscribers.settle() else {
            return;
        };
        info!(
            "Subscribed to {} ({} waiting subscriber(s))",
            wire_name,
            waiters.len()
        );
        let entry = ChannelEntry {
            handle,
            subscribers: self.subscribers.clone(),
        };
        for waiter in waiters {
            shared.admit(&entry, &self.channel, waiter, members.as_deref());
        }
    }

    fn fail(&self, error: PusherError) {
        let wire_name = self.channel.wire_name();
        // Unlist the channel before settling so no later subscriber binds to it
        if let Some(shared) = self.shared.upgrade() {
            let ours = shared
                .channels
                .remove_if(&wire_name, |_, entry| {
                    Arc::ptr_eq(&entry.subscribers, &self.subscribers)
                })
                .is_some();
            if ours {
                shared.rosters.remove(&wire_name);
                shared.registry.remove_all_for_channel(&wire_name);
            }
        }

        let Some(waiters) = self.subscribers.settle() else {
            return;
        };
        warn!("Subscription to {} failed: {}", wire_name, error);
        for waiter in waiters {
            waiter.listener.on_authentication_failure(error.message());
            let _ = waiter.reply.send(Err(error.clone()));
        }
    }

    fn roster(&self) -> Option<Arc<Members>> {
        self.shared
            .upgrade()
            .and_then(|shared| shared.roster(&self.channel.wire_name()))
    }
}

impl ChannelDelegate for SubscriptionDelegate {
    fn on_subscription_succeeded(&self, channel: Arc<dyn NativeChannel>) {
        self.succeed(channel, None);
    }

    fn on_subscription_failed(&self, message: &str) {
        self.fail(PusherError::subscription(message));
    }

    fn on_authentication_failure(&self, message: &str) {
        self.fail(PusherError::authorization(message));
    }
}

impl PresenceDelegate for SubscriptionDelegate {
    fn on_subscription_succeeded(&self, channel: Arc<dyn NativeChannel>, members: Vec<NativeMember>) {
        let members = members.iter().map(Member::from_native).collect();
        self.succeed(channel, Some(members));
    }

    fn on_subscription_failed(&self, message: &str) {
        self.fail(PusherError::subscription(message));
    }

    fn on_authentication_failure(&self, message: &str) {
        self.fail(PusherError::authorization(message));
    }

    fn on_member_added(&self, member: &NativeMember) {
        let Some(roster) = self.roster() else {
            return;
        };

        if let Some(member) = roster.add(Member::from_native(member)) {
            debug!(
                "Member {} joined {} ({} online)",
                member.user_id,
                self.channel,
                roster.count()
            );
            for listener in self.subscribers.listeners() {
                listener.member_subscribed(self.channel.bare_name(), &member);
            }
        }
    }

    fn on_member_removed(&self, member: &NativeMember) {
        let Some(roster) = self.roster() else {
            return;
        };

        if let Some(member) = roster.remove(&member.id) {
            debug!(
                "Member {} left {} ({} online)",
                member.user_id,
                self.channel,
                roster.count()
            );
            for listener in self.subscribers.listeners() {
                listener.member_unsubscribed(self.channel.bare_name(), &member);
            }
        }
    }
}

/// Pub/sub client over a native real-time SDK.
///
/// Every operation validates its input before touching the transport.
/// Channel identifiers follow the naming convention selected in
/// [`PusherOptions::channel_naming`].
///
/// # Example
///
/// ```ignore
/// use pusher_native::{CallbackListener, LoopbackTransport, Pusher, PusherOptions};
/// use std::sync::Arc;
///
/// let transport = Arc::new(LoopbackTransport::new());
/// let pusher = Pusher::new("app-key", PusherOptions::new().cluster("eu"), transport.factory())?;
/// pusher.connect().await?;
///
/// let listener = CallbackListener::new()
///     .on_event(|event| println!("{}: {}", event.event_name, event.data))
///     .build();
/// let id = pusher.subscribe("private-room", "move", listener).await?;
/// pusher.trigger("private-room", "move", &serde_json::json!({"x": 1})).await?;
/// pusher.unsubscribe("private-room", Some(&[id]))?;
/// ```
pub struct Pusher {
    /// Application key
    key: String,
    config: Arc<Config>,
    /// Session ID (random per facade instance)
    session_id: u32,
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
}

impl Pusher {
    /// Validate the app key and options, then build the native transport.
    ///
    /// The factory is not invoked when validation fails.
    pub fn new(
        app_key: impl Into<String>,
        options: PusherOptions,
        factory: impl TransportFactory,
    ) -> Result<Self> {
        let key = app_key.into();
        validation::app_key(&key)?;
        validation::options(&options)?;

        let session_id = rand::random::<u32>();
        info!(
            "Creating Pusher client for app '{}' (session: {})",
            key, session_id
        );

        let config = Arc::new(Config::new(&key, options));
        let transport = factory.create(&key, &config)?;

        Ok(Self {
            key,
            config,
            session_id,
            transport,
            shared: Arc::new(Shared {
                tracker: Arc::new(ConnectionTracker::new()),
                channels: DashMap::new(),
                registry: BindingRegistry::new(),
                rosters: DashMap::new(),
            }),
        })
    }

    /// Get the app key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the session ID
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// Get the configuration derived from the options
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the connection state
    pub fn state(&self) -> ConnectionState {
        self.shared.tracker.state()
    }

    /// Connect and wait until the transport reports Connected.
    ///
    /// Fails with the transport's message on a connection error. Every
    /// outstanding call observes the next terminal transition; while a
    /// connection attempt is in progress no new one is started.
    pub async fn connect(&self) -> Result<()> {
        let state = self.state();
        if state.is_connected() {
            return Ok(());
        }

        let waiter = self.shared.tracker.wait();
        if state.is_active() {
            debug!("Connection attempt already in progress");
        } else {
            info!("Connecting to {}", self.config.ws_url);
            self.transport.connect(self.shared.tracker.clone());
        }

        waiter
            .await
            .map_err(|_| PusherError::connection("Connection attempt was abandoned"))?
    }

    /// Ask the transport to disconnect without waiting for it
    pub fn disconnect(&self) {
        info!("Disconnecting");
        self.transport.disconnect();
    }

    /// Bind `listener` to `event_name` on a channel, subscribing if needed.
    ///
    /// Resolves with the binding ID once the native channel is subscribed.
    /// Calls made while the native subscription is pending wait for the same
    /// outcome; later calls bind straight onto the subscribed handle.
    pub async fn subscribe(
        &self,
        channel: &str,
        event_name: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Result<BindingId> {
        let channel = validation::subscription(
            channel,
            self.config.channel_naming,
            event_name,
            listener.as_ref(),
        )?;
        let wire_name = channel.wire_name();

        let (tx, rx) = oneshot::channel();
        let waiter = Waiter {
            event_name: event_name.to_string(),
            listener,
            reply: tx,
        };

        match self.shared.entry(&wire_name) {
            Some(entry) => match entry.subscribers.enqueue(waiter) {
                None => debug!("Waiting on pending subscription to {}", wire_name),
                Some(waiter) => {
                    debug!("Reusing native subscription for {}", wire_name);
                    let members = (channel.channel_type() == ChannelType::Presence).then(|| {
                        self.shared
                            .roster(&wire_name)
                            .map(|roster| roster.all())
                            .unwrap_or_default()
                    });
                    self.shared
                        .admit(&entry, &channel, waiter, members.as_deref());
                }
            },
            None => {
                let subscribers = Arc::new(Subscribers::pending(waiter));
                let delegate = Arc::new(SubscriptionDelegate {
                    shared: Arc::downgrade(&self.shared),
                    channel: channel.clone(),
                    subscribers: subscribers.clone(),
                });

                info!("Subscribing to {} ({})", wire_name, channel.channel_type());
                let handle = match channel.channel_type() {
                    ChannelType::Public => self.transport.subscribe_public(&wire_name, delegate),
                    ChannelType::Private => self.transport.subscribe_private(&wire_name, delegate),
                    ChannelType::Presence => {
                        self.transport.subscribe_presence(&wire_name, delegate)
                    }
                };
                self.shared.channels.insert(
                    wire_name.clone(),
                    ChannelEntry {
                        handle,
                        subscribers,
                    },
                );
            }
        }

        rx.await.map_err(|_| {
            PusherError::subscription(format!("Subscription to {} was abandoned", wire_name))
        })?
    }

    /// Remove bindings from a channel.
    ///
    /// Without IDs the whole native subscription is torn down. With IDs only
    /// the matching bindings on this channel are removed; unknown IDs are
    /// ignored.
    pub fn unsubscribe(&self, channel: &str, binding_ids: Option<&[BindingId]>) -> Result<()> {
        let channel =
            validation::unsubscription(channel, self.config.channel_naming, binding_ids)?;
        let wire_name = channel.wire_name();

        match binding_ids {
            Some(ids) => {
                for binding in self.shared.registry.find_by_ids(&wire_name, ids) {
                    debug!("Unbinding {} from {}", binding.id, wire_name);
                    self.shared.release(&binding);
                }
            }
            None => {
                let Some(entry) = self.shared.forget(&wire_name) else {
                    debug!("No subscription to tear down for {}", wire_name);
                    return Ok(());
                };

                info!("Unsubscribing from {}", wire_name);
                self.transport.unsubscribe(&wire_name);

                let abandoned = entry.subscribers.settle().unwrap_or_default();
                for waiter in abandoned {
                    let _ = waiter.reply.send(Err(PusherError::subscription(format!(
                        "Unsubscribed from {} before the subscription completed",
                        wire_name
                    ))));
                }
            }
        }

        Ok(())
    }

    /// Send a client event on a private or presence channel.
    ///
    /// The send waits until the native channel reports subscribed, polling
    /// every `trigger_poll_interval`, and fails after `trigger_timeout`.
    pub async fn trigger<T>(&self, channel: &str, event_name: &str, data: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_value(data)?;
        let channel =
            validation::client_event(channel, self.config.channel_naming, event_name, &data)?;

        let wire_name = channel.wire_name();
        let handle = self.shared.handle(&wire_name).ok_or_else(|| {
            PusherError::invalid_state(format!("Not subscribed to {}", wire_name))
        })?;

        if !handle.is_subscribed() {
            debug!("Deferring '{}' until {} is subscribed", event_name, wire_name);
        }
        poll_until(
            self.config.trigger_poll_interval,
            self.config.trigger_timeout,
            || handle.is_subscribed(),
        )
        .await?;

        let wire_event = format!("{}{}", CLIENT_EVENT_PREFIX, event_name);
        debug!("Sending '{}' on {}", wire_event, wire_name);
        handle.trigger(&wire_event, &serde_json::to_string(&data)?)
    }

    /// `trigger` that can be cancelled through an abort handle
    pub async fn trigger_abortable<T>(
        &self,
        channel: &str,
        event_name: &str,
        data: &T,
        registration: AbortRegistration,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        Abortable::new(self.trigger(channel, event_name, data), registration)
            .await
            .unwrap_or_else(|_| {
                Err(PusherError::cancelled(format!(
                    "Client event '{}' was cancelled",
                    event_name
                )))
            })
    }

    /// Whether the native channel reports subscribed
    pub fn is_subscribed(&self, channel: &str) -> Result<bool> {
        let channel = validation::channel(channel, self.config.channel_naming)?;
        Ok(self
            .shared
            .handle(&channel.wire_name())
            .map(|handle| handle.is_subscribed())
            .unwrap_or(false))
    }

    /// Current roster of a presence channel, ordered by user ID
    pub fn members(&self, channel: &str) -> Result<Vec<Member>> {
        let channel = validation::channel(channel, self.config.channel_naming)?;
        if channel.channel_type() != ChannelType::Presence {
            return Err(PusherError::invalid_channel(format!(
                "{} is not a presence channel",
                channel
            )));
        }

        Ok(self
            .shared
            .roster(&channel.wire_name())
            .map(|roster| roster.all())
            .unwrap_or_default())
    }

    /// Number of live bindings across all channels
    pub fn binding_count(&self) -> usize {
        self.shared.registry.count()
    }

    /// Live bindings on a channel, in registration order
    pub fn bindings(&self, channel: &str) -> Result<Vec<EventBinding>> {
        let channel = validation::channel(channel, self.config.channel_naming)?;
        Ok(self.shared.registry.for_channel(&channel.wire_name()))
    }
}

impl std::fmt::Debug for Pusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pusher")
            .field("key", &self.key)
            .field("session_id", &self.session_id)
            .field("state", &self.state())
            .field("channel_count", &self.shared.channels.len())
            .field("binding_count", &self.binding_count())
            .finish()
    }
}
