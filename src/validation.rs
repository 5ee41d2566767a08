//! Input validation.
//!
//! Pure checks run before any stateful operation. Each function checks one
//! input category and fails with a descriptive error; the composite checks
//! at the bottom bundle them per facade operation.

use serde_json::Value;

use crate::channels::{ChannelName, ChannelNaming};
use crate::error::{PusherError, Result};
use crate::events::{BindingId, ChannelListener};
use crate::options::PusherOptions;

/// The app key must be a non-empty string
pub fn app_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(PusherError::config(
            "The app key is required and can not be empty",
        ));
    }
    Ok(())
}

/// Per-field option checks
pub fn options(options: &PusherOptions) -> Result<()> {
    if options.platform.requires_explicit_encryption() && options.encrypted.is_none() {
        return Err(PusherError::config(
            "options.encrypted is required and must be a boolean on this platform",
        ));
    }

    if let Some(ref authorizer) = options.authorizer {
        non_empty("options.authorizer", authorizer)?;
        // Relative endpoints are resolved by the native SDK
        if authorizer.contains("://") {
            url::Url::parse(authorizer)?;
        }
    }

    if let Some(ref cluster) = options.cluster {
        non_empty("options.cluster", cluster)?;
    }

    if let Some(ref host) = options.host {
        non_empty("options.host", host)?;
    }

    for (field, port) in [("options.wsPort", options.ws_port), ("options.wssPort", options.wss_port)] {
        if port == Some(0) {
            return Err(PusherError::config(format!("{} must be a valid port", field)));
        }
    }

    for (field, value) in [
        ("options.activityTimeout", options.activity_timeout_ms),
        ("options.pongTimeout", options.pong_timeout_ms),
        ("options.triggerPollInterval", options.trigger_poll_interval_ms),
        ("options.triggerTimeout", options.trigger_timeout_ms),
    ] {
        if value == Some(0) {
            return Err(PusherError::config(format!(
                "{} must be a positive number of milliseconds",
                field
            )));
        }
    }

    Ok(())
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PusherError::config(format!("{} can not be empty", field)));
    }
    Ok(())
}

/// Resolve a channel identifier; fails when it is empty, untyped or unnamed
pub fn channel(identifier: &str, naming: ChannelNaming) -> Result<ChannelName> {
    ChannelName::parse(identifier, naming)
}

/// Resolve a channel identifier that client events can be sent on
pub fn trigger_channel(identifier: &str, naming: ChannelNaming) -> Result<ChannelName> {
    let channel = channel(identifier, naming)?;
    if !channel.channel_type().supports_client_events() {
        return Err(PusherError::invalid_channel(
            "The type of the channel can not be public",
        ));
    }
    Ok(channel)
}

/// Event names must be non-empty
pub fn event_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PusherError::invalid_event(
            "The event name is required and can not be empty",
        ));
    }
    Ok(())
}

/// Client event payloads must be JSON objects (or arrays)
pub fn event_data(data: &Value) -> Result<()> {
    match data {
        Value::Object(_) | Value::Array(_) => Ok(()),
        _ => Err(PusherError::invalid_event(
            "The event data is required and must be an object",
        )),
    }
}

/// Listeners must at least handle events
pub fn listener(listener: &dyn ChannelListener) -> Result<()> {
    if !listener.handles_events() {
        return Err(PusherError::invalid_argument(
            "The channel listener must have at least an 'onEvent' handler",
        ));
    }
    Ok(())
}

/// When given, binding IDs must be a non-empty list
pub fn binding_ids(ids: Option<&[BindingId]>) -> Result<()> {
    if let Some(ids) = ids {
        if ids.is_empty() {
            return Err(PusherError::invalid_argument(
                "The event binding IDs must be a list and can not be empty",
            ));
        }
    }
    Ok(())
}

/// Checks for `subscribe`
pub fn subscription(
    identifier: &str,
    naming: ChannelNaming,
    name: &str,
    subscriber: &dyn ChannelListener,
) -> Result<ChannelName> {
    let channel = channel(identifier, naming)?;
    event_name(name)?;
    listener(subscriber)?;
    Ok(channel)
}

/// Checks for `unsubscribe`
pub fn unsubscription(
    identifier: &str,
    naming: ChannelNaming,
    ids: Option<&[BindingId]>,
) -> Result<ChannelName> {
    let channel = channel(identifier, naming)?;
    binding_ids(ids)?;
    Ok(channel)
}

/// Checks for `trigger`
pub fn client_event(
    identifier: &str,
    naming: ChannelNaming,
    name: &str,
    data: &Value,
) -> Result<ChannelName> {
    let channel = trigger_channel(identifier, naming)?;
    event_name(name)?;
    event_data(data)?;
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelType;
    use crate::events::CallbackListener;
    use crate::options::Platform;
    use serde_json::json;

    #[test]
    fn test_app_key() {
        assert!(app_key("key").is_ok());
        assert!(app_key("").unwrap_err().is_validation());
        assert!(app_key("  ").is_err());
    }

    #[test]
    fn test_ios_requires_encrypted_flag() {
        let mut opts = PusherOptions::new().platform(Platform::Ios);
        opts.encrypted = None;
        assert!(options(&opts).is_err());

        opts.encrypted = Some(false);
        assert!(options(&opts).is_ok());

        let mut android = PusherOptions::new().platform(Platform::Android);
        android.encrypted = None;
        assert!(options(&android).is_ok());
    }

    #[test]
    fn test_option_fields() {
        assert!(options(&PusherOptions::new().cluster("")).is_err());
        assert!(options(&PusherOptions::new().host(" ")).is_err());
        assert!(options(&PusherOptions::new().ws_port(0)).is_err());
        assert!(options(&PusherOptions::new().pong_timeout_ms(0)).is_err());
        assert!(options(&PusherOptions::new().authorizer("http://[bad")).is_err());
        assert!(options(&PusherOptions::new().authorizer("/pusher/auth")).is_ok());
        assert!(options(&PusherOptions::new().authorizer("https://example.com/auth")).is_ok());
    }

    #[test]
    fn test_trigger_rejects_public_channels() {
        let err = trigger_channel("news", ChannelNaming::Prefixed).unwrap_err();
        assert_eq!(err.message(), "The type of the channel can not be public");

        let err = trigger_channel("public-news", ChannelNaming::Composite).unwrap_err();
        assert!(err.is_validation());

        let ok = trigger_channel("presence-room", ChannelNaming::Prefixed).unwrap();
        assert_eq!(ok.channel_type(), ChannelType::Presence);
    }

    #[test]
    fn test_event_data_must_be_object() {
        assert!(event_data(&json!({"a": 1})).is_ok());
        assert!(event_data(&json!([1, 2])).is_ok());
        assert!(event_data(&Value::Null).is_err());
        assert!(event_data(&json!("text")).is_err());
        assert!(event_data(&json!(3)).is_err());
    }

    #[test]
    fn test_listener_shape() {
        let good = CallbackListener::new().on_event(|_| {});
        let bad = CallbackListener::new().on_authentication_failure(|_| {});
        assert!(listener(&good).is_ok());
        assert!(listener(&bad).is_err());
    }

    #[test]
    fn test_binding_ids() {
        assert!(binding_ids(None).is_ok());
        assert!(binding_ids(Some(&[1, 2][..])).is_ok());
        assert!(binding_ids(Some(&[][..])).is_err());
    }

    #[test]
    fn test_subscription_checks_in_order() {
        let good = CallbackListener::new().on_event(|_| {});

        let err = subscription("", ChannelNaming::Prefixed, "", &good).unwrap_err();
        assert!(matches!(err, PusherError::InvalidChannel { .. }));

        let err = subscription("room", ChannelNaming::Prefixed, "", &good).unwrap_err();
        assert!(matches!(err, PusherError::InvalidEvent { .. }));

        let channel = subscription("room", ChannelNaming::Prefixed, "move", &good).unwrap();
        assert_eq!(channel.wire_name(), "room");
    }
}
