//! Listener contract, delivered events and the binding registry.

mod event;
mod listener;
mod registry;

pub use event::ChannelEvent;
pub use listener::{CallbackListener, ChannelListener};
pub use registry::{BindingId, BindingRegistry, EventBinding};
