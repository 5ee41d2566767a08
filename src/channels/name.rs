//! Channel naming: types, bare names and wire names.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, PusherError};

const PRIVATE_PREFIX: &str = "private-";
const PRESENCE_PREFIX: &str = "presence-";

/// Channel type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Public channel - no authentication required
    Public,
    /// Private channel - requires authentication
    Private,
    /// Presence channel - private with member tracking
    Presence,
}

impl ChannelType {
    /// Parse a type keyword (`public`, `private`, `presence`)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "presence" => Some(Self::Presence),
            _ => None,
        }
    }

    /// The type keyword, also used as the wire prefix for non-public channels
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Presence => "presence",
        }
    }

    /// Check if this channel type supports client events
    pub fn supports_client_events(&self) -> bool {
        matches!(self, Self::Private | Self::Presence)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How caller-supplied channel identifiers are parsed.
///
/// A facade uses exactly one convention; the two disagree on public
/// channels whose bare name contains a hyphen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelNaming {
    /// `private-` and `presence-` prefixes are recognized, anything else is
    /// public. The identifier is the wire name.
    #[default]
    Prefixed,
    /// `type-name` for every channel type, e.g. `public-news`.
    Composite,
}

/// A resolved channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName {
    channel_type: ChannelType,
    bare_name: String,
}

impl ChannelName {
    /// Build a channel name from its parts. The bare name must be non-empty.
    pub fn new(channel_type: ChannelType, bare_name: impl Into<String>) -> Result<Self> {
        let bare_name = bare_name.into();
        if bare_name.is_empty() {
            return Err(PusherError::invalid_channel(
                "The channel identifier must have the name of the channel",
            ));
        }
        Ok(Self {
            channel_type,
            bare_name,
        })
    }

    /// Resolve an identifier using the given convention
    pub fn parse(raw: &str, naming: ChannelNaming) -> Result<Self> {
        if raw.is_empty() {
            return Err(PusherError::invalid_channel(
                "The channel identifier is required and can not be empty",
            ));
        }

        match naming {
            ChannelNaming::Prefixed => Self::from_prefixed(raw),
            ChannelNaming::Composite => Self::from_composite(raw),
        }
    }

    /// Resolve a prefixed identifier (`private-x`, `presence-x`, `x`)
    pub fn from_prefixed(raw: &str) -> Result<Self> {
        if let Some(bare) = raw.strip_prefix(PRIVATE_PREFIX) {
            Self::new(ChannelType::Private, bare)
        } else if let Some(bare) = raw.strip_prefix(PRESENCE_PREFIX) {
            Self::new(ChannelType::Presence, bare)
        } else {
            Self::new(ChannelType::Public, raw)
        }
    }

    /// Resolve a composite identifier (`public-x`, `private-x`, `presence-x`).
    ///
    /// Only the first hyphen separates the type, so `private-my-room` has
    /// the bare name `my-room`.
    pub fn from_composite(raw: &str) -> Result<Self> {
        let (keyword, bare) = raw.split_once('-').unwrap_or((raw, ""));
        let channel_type = ChannelType::from_keyword(keyword).ok_or_else(|| {
            PusherError::invalid_channel(format!(
                "The channel identifier must have the type of the channel: {}",
                raw
            ))
        })?;
        Self::new(channel_type, bare)
    }

    /// Get channel type
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Get the name without any type prefix
    pub fn bare_name(&self) -> &str {
        &self.bare_name
    }

    /// The literal name sent to the transport.
    pub fn wire_name(&self) -> String {
        match self.channel_type {
            ChannelType::Public => self.bare_name.clone(),
            ChannelType::Private | ChannelType::Presence => {
                format!("{}-{}", self.channel_type.keyword(), self.bare_name)
            }
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_resolution() {
        let public = ChannelName::from_prefixed("news").unwrap();
        assert_eq!(public.channel_type(), ChannelType::Public);
        assert_eq!(public.bare_name(), "news");
        assert_eq!(public.wire_name(), "news");

        let private = ChannelName::from_prefixed("private-room").unwrap();
        assert_eq!(private.channel_type(), ChannelType::Private);
        assert_eq!(private.bare_name(), "room");
        assert_eq!(private.wire_name(), "private-room");

        let presence = ChannelName::from_prefixed("presence-room1").unwrap();
        assert_eq!(presence.channel_type(), ChannelType::Presence);
        assert_eq!(presence.bare_name(), "room1");
    }

    #[test]
    fn test_prefixed_public_names_keep_hyphens() {
        let channel = ChannelName::from_prefixed("public-news").unwrap();
        assert_eq!(channel.channel_type(), ChannelType::Public);
        assert_eq!(channel.bare_name(), "public-news");
    }

    #[test]
    fn test_prefix_without_name_is_rejected() {
        assert!(ChannelName::from_prefixed("private-").is_err());
        assert!(ChannelName::from_prefixed("presence-").is_err());
        assert!(ChannelName::parse("", ChannelNaming::Prefixed).is_err());
    }

    #[test]
    fn test_composite_resolution() {
        let public = ChannelName::from_composite("public-news").unwrap();
        assert_eq!(public.channel_type(), ChannelType::Public);
        assert_eq!(public.bare_name(), "news");
        assert_eq!(public.wire_name(), "news");

        let private = ChannelName::from_composite("private-my-room").unwrap();
        assert_eq!(private.bare_name(), "my-room");
        assert_eq!(private.wire_name(), "private-my-room");
    }

    #[test]
    fn test_composite_requires_type() {
        assert!(ChannelName::from_composite("news").is_err());
        assert!(ChannelName::from_composite("secret-news").is_err());
        assert!(ChannelName::from_composite("public-").is_err());
    }

    #[test]
    fn test_wire_name_round_trip_is_idempotent() {
        for raw in ["news", "private-room", "presence-lobby", "a-b-c", "private-x-y"] {
            let wire = ChannelName::from_prefixed(raw).unwrap().wire_name();
            let again = ChannelName::from_prefixed(&wire).unwrap().wire_name();
            assert_eq!(wire, again);
        }
    }

    #[test]
    fn test_client_event_support() {
        assert!(!ChannelType::Public.supports_client_events());
        assert!(ChannelType::Private.supports_client_events());
        assert!(ChannelType::Presence.supports_client_events());
    }
}
