//! Utility functions and types.

pub mod timers;

pub use timers::poll_until;
