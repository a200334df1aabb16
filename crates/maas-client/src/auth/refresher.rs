//! Periodic re-signing of the `Authorization` header for long transfers.
//!
//! MAAS rejects OAuth timestamps outside its skew window, which uploads
//! running longer than ~300s would otherwise exceed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// How often a long-running request re-signs its header.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// Background task that owns a header slot and re-signs it on every tick.
///
/// The request reads the slot once, right before it is sent. The task stops
/// when [`HeaderRefresher::stop`] is called or the refresher is dropped, so a
/// cancelled request never leaks the timer.
pub struct HeaderRefresher {
    slot: Arc<RwLock<Option<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl HeaderRefresher {
    /// Sign once immediately, then every `interval` until stopped.
    ///
    /// `sign` returns `None` when no header can be built (bad credential).
    #[must_use]
    pub fn spawn<F>(interval: Duration, sign: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        let slot = Arc::new(RwLock::new(sign()));
        let task_slot = Arc::clone(&slot);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!(
                    at = %chrono::Utc::now().to_rfc3339(),
                    "Refreshing authorization header"
                );
                let header = sign();
                *task_slot.write().await = header;
            }
        });

        Self {
            slot,
            handle: Some(handle),
        }
    }

    /// The most recently signed header.
    pub async fn current(&self) -> Option<String> {
        self.slot.read().await.clone()
    }

    /// Stop the background task.
    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for HeaderRefresher {
    fn drop(&mut self) {
        self.abort();
    }
}
