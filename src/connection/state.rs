//! Connection state as reported by the native transport.

use serde::{Deserialize, Serialize};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Initial state, never transitioned to
    #[default]
    Initialized,
    /// Connection is being established
    Connecting,
    /// Connection has been fully established
    Connected,
    /// Requested disconnection
    Disconnected,
    /// Connection unavailable (no network, timeout)
    Unavailable,
    /// Connection failed
    Failed,
}

impl ConnectionState {
    /// Check if currently connecting or connected
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity() {
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Connected.is_active());
        assert!(!ConnectionState::Unavailable.is_active());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert_eq!(ConnectionState::default(), ConnectionState::Initialized);
    }
}
