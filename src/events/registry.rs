//! Registry of active (channel, event, listener) bindings.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::channels::ChannelName;
use crate::transports::NativeBindingId;

/// Caller-facing handle for one binding
pub type BindingId = u64;

/// One (channel, event name, listener) registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub id: BindingId,
    /// Bare channel name
    pub channel: String,
    pub wire_name: String,
    pub event_name: String,
    /// Handle needed to unbind from the native channel
    pub native: NativeBindingId,
}

/// Registry owning every binding of a facade.
///
/// IDs come from a counter that never goes backwards, so an ID is never
/// reissued after removals.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: RwLock<Vec<EventBinding>>,
    next_id: AtomicU64,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding and hand out its ID
    pub fn allocate(
        &self,
        channel: &ChannelName,
        event_name: impl Into<String>,
        native: NativeBindingId,
    ) -> BindingId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let binding = EventBinding {
            id,
            channel: channel.bare_name().to_string(),
            wire_name: channel.wire_name(),
            event_name: event_name.into(),
            native,
        };

        debug!(
            "Allocated binding {} for '{}' on {}",
            id, binding.event_name, binding.wire_name
        );
        self.bindings.write().push(binding);
        id
    }

    /// Bindings on `wire_name` whose ID is in `ids`
    pub fn find_by_ids(&self, wire_name: &str, ids: &[BindingId]) -> Vec<EventBinding> {
        self.bindings
            .read()
            .iter()
            .filter(|b| b.wire_name == wire_name && ids.contains(&b.id))
            .cloned()
            .collect()
    }

    /// Get a binding by ID
    pub fn get(&self, id: BindingId) -> Option<EventBinding> {
        self.bindings.read().iter().find(|b| b.id == id).cloned()
    }

    /// Remove one binding, keeping the others in order
    pub fn remove(&self, id: BindingId) -> Option<EventBinding> {
        let mut bindings = self.bindings.write();
        let index = bindings.iter().position(|b| b.id == id)?;
        Some(bindings.remove(index))
    }

    /// Remove every binding on a wire name
    pub fn remove_all_for_channel(&self, wire_name: &str) -> Vec<EventBinding> {
        let mut bindings = self.bindings.write();
        let (removed, kept): (Vec<_>, Vec<_>) = bindings
            .drain(..)
            .partition(|b| b.wire_name == wire_name);
        *bindings = kept;

        if !removed.is_empty() {
            debug!("Removed {} binding(s) for {}", removed.len(), wire_name);
        }
        removed
    }

    /// Bindings on a wire name, in registration order
    pub fn for_channel(&self, wire_name: &str) -> Vec<EventBinding> {
        self.bindings
            .read()
            .iter()
            .filter(|b| b.wire_name == wire_name)
            .cloned()
            .collect()
    }

    /// Number of live bindings
    pub fn count(&self) -> usize {
        self.bindings.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelType;

    fn channel(raw: &str) -> ChannelName {
        ChannelName::from_prefixed(raw).unwrap()
    }

    #[test]
    fn test_ids_start_at_zero_and_increase() {
        let registry = BindingRegistry::new();
        let room = channel("private-room");

        assert_eq!(registry.allocate(&room, "a", NativeBindingId(7)), 0);
        assert_eq!(registry.allocate(&room, "b", NativeBindingId(8)), 1);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let registry = BindingRegistry::new();
        let room = channel("room");

        let first = registry.allocate(&room, "a", NativeBindingId(1));
        let second = registry.allocate(&room, "b", NativeBindingId(2));
        registry.remove(first);

        let third = registry.allocate(&room, "c", NativeBindingId(3));
        assert_ne!(third, first);
        assert_ne!(third, second);
    }

    #[test]
    fn test_remove_preserves_other_entries() {
        let registry = BindingRegistry::new();
        let room = channel("room");

        let a = registry.allocate(&room, "a", NativeBindingId(1));
        let b = registry.allocate(&room, "b", NativeBindingId(2));
        let c = registry.allocate(&room, "c", NativeBindingId(3));

        let removed = registry.remove(b).unwrap();
        assert_eq!(removed.event_name, "b");
        assert!(registry.remove(b).is_none());

        let ids: Vec<_> = registry.for_channel("room").iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_channels_keyed_by_wire_name() {
        let registry = BindingRegistry::new();
        let public = channel("room");
        let private = channel("private-room");
        assert_eq!(private.channel_type(), ChannelType::Private);

        let public_id = registry.allocate(&public, "a", NativeBindingId(1));
        let private_id = registry.allocate(&private, "a", NativeBindingId(2));

        assert!(registry.find_by_ids("room", &[private_id]).is_empty());
        assert_eq!(registry.find_by_ids("room", &[public_id, 99]).len(), 1);

        let removed = registry.remove_all_for_channel("private-room");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].channel, "room");
        assert_eq!(registry.count(), 1);
        assert!(registry.get(public_id).is_some());
    }
}
