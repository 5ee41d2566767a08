//! Timer utilities.

use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::error::{PusherError, Result};

/// Re-check `ready` every `every` until it returns true.
///
/// The first check happens immediately. With a `limit`, fails with a
/// timeout error once the limit elapses; without one, waits indefinitely.
/// Dropping the returned future stops the polling.
pub async fn poll_until<F>(every: Duration, limit: Option<Duration>, mut ready: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let poll = async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if ready() {
                return;
            }
        }
    };

    match limit {
        Some(limit) => timeout(limit, poll).await.map_err(|_| {
            PusherError::timeout(format!("Condition not met within {}ms", limit.as_millis()))
        }),
        None => {
            poll.await;
            Ok(())
        }
    }
}
