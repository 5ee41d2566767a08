//! Error types for the pusher-native facade.

use thiserror::Error;

/// Result type alias for facade operations
pub type Result<T> = std::result::Result<T, PusherError>;

/// Main error type for the facade
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PusherError {
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Authorization error: {message}")]
    AuthorizationError { message: String },

    #[error("Subscription error: {message}")]
    SubscriptionError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Invalid channel: {message}")]
    InvalidChannel { message: String },

    #[error("Invalid event: {message}")]
    InvalidEvent { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    #[error("Timeout error: {message}")]
    TimeoutError { message: String },

    #[error("Cancelled: {message}")]
    CancelledError { message: String },
}

impl PusherError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: msg.into(),
        }
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::AuthorizationError {
            message: msg.into(),
        }
    }

    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::SubscriptionError {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: msg.into(),
        }
    }

    pub fn invalid_channel(msg: impl Into<String>) -> Self {
        Self::InvalidChannel {
            message: msg.into(),
        }
    }

    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: msg.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError {
            message: msg.into(),
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::TimeoutError {
            message: msg.into(),
        }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::CancelledError {
            message: msg.into(),
        }
    }

    /// Whether this error was raised by input validation, before any
    /// native call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError { .. }
                | Self::InvalidChannel { .. }
                | Self::InvalidEvent { .. }
                | Self::InvalidArgument { .. }
        )
    }

    /// The bare message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConnectionError { message }
            | Self::AuthorizationError { message }
            | Self::SubscriptionError { message }
            | Self::ConfigurationError { message }
            | Self::InvalidChannel { message }
            | Self::InvalidEvent { message }
            | Self::InvalidArgument { message }
            | Self::InvalidState { message }
            | Self::SerializationError { message }
            | Self::TimeoutError { message }
            | Self::CancelledError { message } => message,
        }
    }
}

impl From<serde_json::Error> for PusherError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<url::ParseError> for PusherError {
    fn from(err: url::ParseError) -> Self {
        Self::config(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(PusherError::invalid_channel("x").is_validation());
        assert!(PusherError::config("x").is_validation());
        assert!(!PusherError::authorization("x").is_validation());
        assert!(!PusherError::timeout("x").is_validation());
    }

    #[test]
    fn test_message_is_verbatim() {
        let err = PusherError::authorization("Forbidden");
        assert_eq!(err.message(), "Forbidden");
        assert_eq!(err.to_string(), "Authorization error: Forbidden");
    }
}
