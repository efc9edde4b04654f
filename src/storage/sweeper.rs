// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Expiry Sweeper
//!
//! Background task that periodically drops expired revocation records.
//! Correctness never depends on it: reads already ignore expired records.
//! It only keeps the in-process backends from growing without bound.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::RevocationStore;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic purge of expired revocation records.
pub struct ExpirySweeper {
    store: Arc<dyn RevocationStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            backend = self.store.backend(),
            "Revocation sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Revocation sweeper shutting down");
                    return;
                }
            }

            self.sweep_once().await;
        }
    }

    /// Execute one purge, returning the number of records removed.
    pub async fn sweep_once(&self) -> usize {
        match self.store.purge_expired().await {
            Ok(0) => 0,
            Ok(removed) => {
                debug!(removed, "Revocation sweeper: purged expired records");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Revocation sweeper: purge failed, will retry");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::storage::test_stores::FailingStore;
    use crate::storage::InMemoryRevocationStore;

    #[tokio::test]
    async fn sweep_once_purges_expired() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryRevocationStore::new(clock.clone()));
        store.set_with_expiry("a", "user", 5).await.unwrap();
        store.set_with_expiry("b", "user", 500).await.unwrap();
        clock.advance(10);

        let sweeper = ExpirySweeper::new(store.clone());
        assert_eq!(sweeper.sweep_once().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn sweep_failure_is_swallowed() {
        let sweeper = ExpirySweeper::new(Arc::new(FailingStore));
        assert_eq!(sweeper.sweep_once().await, 0);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(InMemoryRevocationStore::new(clock));
        let sweeper = ExpirySweeper::new(store).with_interval(Duration::from_millis(5));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
