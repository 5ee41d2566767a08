//! Connection state tracking and pending `connect()` resolution.

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::state::ConnectionState;
use crate::error::{PusherError, Result};
use crate::transports::ConnectionDelegate;

/// Tracks the transport's connection state and resolves every pending
/// `connect()` call on the next terminal transition.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    /// Current state
    state: RwLock<ConnectionState>,
    /// One sender per outstanding `connect()` call
    waiters: Mutex<Vec<oneshot::Sender<Result<()>>>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Register a waiter for the next terminal transition.
    ///
    /// Resolves immediately when already connected.
    pub fn wait(&self) -> oneshot::Receiver<Result<()>> {
        let (tx, rx) = oneshot::channel();

        let mut waiters = self.waiters.lock();
        if self.state().is_connected() {
            let _ = tx.send(Ok(()));
        } else {
            waiters.push(tx);
        }

        rx
    }

    /// Number of `connect()` calls still waiting
    pub fn pending(&self) -> usize {
        self.waiters.lock().len()
    }

    fn settle(&self, outcome: Result<()>) {
        let waiters: Vec<_> = self.waiters.lock().drain(..).collect();
        debug!("Settling {} pending connect call(s)", waiters.len());

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl ConnectionDelegate for ConnectionTracker {
    fn on_state_change(&self, previous: ConnectionState, current: ConnectionState) {
        *self.state.write() = current;
        debug!("Connection state: {} -> {}", previous, current);

        if current.is_connected() {
            info!("Connected");
            self.settle(Ok(()));
        }
    }

    fn on_error(&self, message: &str, code: Option<&str>) {
        warn!("Connection error (code: {:?}): {}", code, message);
        self.settle(Err(PusherError::connection(message)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_waiter_observes_connected() {
        let tracker = ConnectionTracker::new();
        let first = tracker.wait();
        let second = tracker.wait();
        assert_eq!(tracker.pending(), 2);

        tracker.on_state_change(ConnectionState::Initialized, ConnectionState::Connecting);
        assert_eq!(tracker.pending(), 2);

        tracker.on_state_change(ConnectionState::Connecting, ConnectionState::Connected);
        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn test_error_rejects_with_transport_message() {
        let tracker = ConnectionTracker::new();
        let waiter = tracker.wait();

        tracker.on_error("Invalid key", Some("4001"));

        let err = waiter.await.unwrap().unwrap_err();
        assert_eq!(err, PusherError::connection("Invalid key"));
    }

    #[tokio::test]
    async fn test_wait_when_connected_resolves_immediately() {
        let tracker = ConnectionTracker::new();
        tracker.on_state_change(ConnectionState::Connecting, ConnectionState::Connected);

        assert!(tracker.wait().await.unwrap().is_ok());
        assert_eq!(tracker.pending(), 0);
    }
}
