//! Channel naming and presence rosters.

mod members;
mod name;

pub use members::{Member, Members};
pub use name::{ChannelName, ChannelNaming, ChannelType};
