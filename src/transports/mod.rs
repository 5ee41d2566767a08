//! Native transport boundary and its in-process implementation.
//!
//! Platform SDK adapters implement the `Transport` trait; the facade only
//! ever talks to that trait. `LoopbackTransport` runs the whole stack in
//! memory for tests and demos.

mod transport;

pub mod loopback;

pub use loopback::{LoopbackChannel, LoopbackTransport};
pub use transport::{
    ChannelDelegate, ConnectionDelegate, EventSink, NativeBindingId, NativeChannel, NativeEvent,
    NativeMember, PresenceDelegate, Transport, TransportFactory,
};
