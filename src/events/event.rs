//! Events delivered to channel listeners.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::transports::NativeEvent;

/// An incoming channel event with its payload decoded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEvent {
    /// Bare channel name
    pub channel: String,
    pub event_name: String,
    pub data: Value,
}

impl ChannelEvent {
    pub fn new(channel: impl Into<String>, event_name: impl Into<String>, data: Value) -> Self {
        Self {
            channel: channel.into(),
            event_name: event_name.into(),
            data,
        }
    }

    /// Decode a native event for delivery on `channel`.
    ///
    /// Payloads that are not valid JSON are delivered as a string value.
    pub fn from_native(channel: impl Into<String>, event: &NativeEvent) -> Self {
        let data = if event.data.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&event.data).unwrap_or_else(|e| {
                warn!(
                    "Undecodable payload for '{}' on {}: {}",
                    event.event_name, event.channel, e
                );
                Value::String(event.data.clone())
            })
        };

        Self::new(channel, event.event_name.clone(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_native_decodes_json() {
        let native = NativeEvent::new("private-room", "move", r#"{"x":1}"#);
        let event = ChannelEvent::from_native("room", &native);
        assert_eq!(event.channel, "room");
        assert_eq!(event.event_name, "move");
        assert_eq!(event.data, json!({"x": 1}));
    }

    #[test]
    fn test_from_native_keeps_raw_text() {
        let native = NativeEvent::new("room", "note", "hello");
        let event = ChannelEvent::from_native("room", &native);
        assert_eq!(event.data, Value::String("hello".to_string()));
    }
}
