//! Connection management.

mod state;
mod tracker;

pub use state::ConnectionState;
pub use tracker::ConnectionTracker;
