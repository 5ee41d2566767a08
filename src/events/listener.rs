//! The listener contract channel subscribers implement.

use std::sync::Arc;

use super::event::ChannelEvent;
use crate::channels::Member;

/// Capabilities a subscriber can provide. Only `on_event` is mandatory.
///
/// Channel names passed to callbacks are bare names.
pub trait ChannelListener: Send + Sync {
    /// Called for every matching event
    fn on_event(&self, event: &ChannelEvent);

    /// Public and private channels: the subscription succeeded
    fn on_subscription_succeeded(&self, _channel: &str) {}

    /// The subscription was refused by the transport
    fn on_authentication_failure(&self, _message: &str) {}

    /// Presence channels: initial member list
    fn on_member_information_received(&self, _channel: &str, _members: &[Member]) {}

    /// Presence channels: a member joined
    fn member_subscribed(&self, _channel: &str, _member: &Member) {}

    /// Presence channels: a member left
    fn member_unsubscribed(&self, _channel: &str, _member: &Member) {}

    /// Whether this listener provides an event handler.
    ///
    /// Listeners assembled at runtime (e.g. across an FFI boundary) may
    /// lack one; they are rejected before subscribing.
    fn handles_events(&self) -> bool {
        true
    }
}

type EventFn = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;
type ChannelFn = Arc<dyn Fn(&str) + Send + Sync>;
type MembersFn = Arc<dyn Fn(&str, &[Member]) + Send + Sync>;
type MemberFn = Arc<dyn Fn(&str, &Member) + Send + Sync>;

/// A listener assembled from closures.
///
/// # Example
///
/// ```ignore
/// let listener = CallbackListener::new()
///     .on_event(|event| println!("{}: {}", event.event_name, event.data))
///     .on_subscription_succeeded(|channel| println!("joined {}", channel));
/// ```
#[derive(Clone, Default)]
pub struct CallbackListener {
    on_event: Option<EventFn>,
    on_subscription_succeeded: Option<ChannelFn>,
    on_authentication_failure: Option<ChannelFn>,
    on_member_information_received: Option<MembersFn>,
    member_subscribed: Option<MemberFn>,
    member_unsubscribed: Option<MemberFn>,
}

impl CallbackListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(mut self, f: impl Fn(&ChannelEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(f));
        self
    }

    pub fn on_subscription_succeeded(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_subscription_succeeded = Some(Arc::new(f));
        self
    }

    pub fn on_authentication_failure(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_authentication_failure = Some(Arc::new(f));
        self
    }

    pub fn on_member_information_received(
        mut self,
        f: impl Fn(&str, &[Member]) + Send + Sync + 'static,
    ) -> Self {
        self.on_member_information_received = Some(Arc::new(f));
        self
    }

    pub fn member_subscribed(mut self, f: impl Fn(&str, &Member) + Send + Sync + 'static) -> Self {
        self.member_subscribed = Some(Arc::new(f));
        self
    }

    pub fn member_unsubscribed(
        mut self,
        f: impl Fn(&str, &Member) + Send + Sync + 'static,
    ) -> Self {
        self.member_unsubscribed = Some(Arc::new(f));
        self
    }

    /// Wrap into a shareable listener handle
    pub fn build(self) -> Arc<dyn ChannelListener> {
        Arc::new(self)
    }
}

impl ChannelListener for CallbackListener {
    fn on_event(&self, event: &ChannelEvent) {
        if let Some(ref f) = self.on_event {
            f(event);
        }
    }

    fn on_subscription_succeeded(&self, channel: &str) {
        if let Some(ref f) = self.on_subscription_succeeded {
            f(channel);
        }
    }

    fn on_authentication_failure(&self, message: &str) {
        if let Some(ref f) = self.on_authentication_failure {
            f(message);
        }
    }

    fn on_member_information_received(&self, channel: &str, members: &[Member]) {
        if let Some(ref f) = self.on_member_information_received {
            f(channel, members);
        }
    }

    fn member_subscribed(&self, channel: &str, member: &Member) {
        if let Some(ref f) = self.member_subscribed {
            f(channel, member);
        }
    }

    fn member_unsubscribed(&self, channel: &str, member: &Member) {
        if let Some(ref f) = self.member_unsubscribed {
            f(channel, member);
        }
    }

    fn handles_events(&self) -> bool {
        self.on_event.is_some()
    }
}

impl std::fmt::Debug for CallbackListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackListener")
            .field("on_event", &self.on_event.is_some())
            .field("on_subscription_succeeded", &self.on_subscription_succeeded.is_some())
            .field("on_authentication_failure", &self.on_authentication_failure.is_some())
            .field(
                "on_member_information_received",
                &self.on_member_information_received.is_some(),
            )
            .field("member_subscribed", &self.member_subscribed.is_some())
            .field("member_unsubscribed", &self.member_unsubscribed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callback_listener_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let listener = CallbackListener::new().on_event(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(listener.handles_events());
        ChannelListener::on_event(&listener, &ChannelEvent::new("room", "move", Value::Null));
        // Missing optional capabilities are no-ops
        ChannelListener::on_subscription_succeeded(&listener, "room");

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_without_event_handler() {
        let listener = CallbackListener::new().on_subscription_succeeded(|_| {});
        assert!(!listener.handles_events());
    }
}
