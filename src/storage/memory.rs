// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local revocation store.
//!
//! Records carry an absolute expiry read from the shared [`Clock`]; reads
//! treat an expired record as absent and the sweeper removes it later.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RevocationStore, StoreResult};
use crate::auth::clock::Clock;

/// Stored value plus its expiry (Unix seconds).
struct Entry {
    value: String,
    expires_at: i64,
}

/// In-memory [`RevocationStore`].
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRevocationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Seconds left on the live record for `key`.
    pub async fn ttl_remaining(&self, key: &str) -> Option<u64> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        u64::try_from(entry.expires_at - now).ok().filter(|secs| *secs > 0)
    }

    /// Number of records held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires_at = self.clock.now().saturating_add(ttl);
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone()))
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    fn store() -> (InMemoryRevocationStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        (InMemoryRevocationStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn set_and_get() {
        let (store, _) = store();
        assert_eq!(store.get("token").await.unwrap(), None);

        store.set_with_expiry("token", "user-42", 60).await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("user-42"));
        assert_eq!(store.ttl_remaining("token").await, Some(60));
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let (store, _) = store();
        store.set_with_expiry("token", "user-42", 60).await.unwrap();
        store.set_with_expiry("token", "blacklist", 30).await.unwrap();

        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("blacklist"));
        assert_eq!(store.ttl_remaining("token").await, Some(30));
    }

    #[tokio::test]
    async fn expired_record_reads_as_absent() {
        let (store, clock) = store();
        store.set_with_expiry("token", "user-42", 60).await.unwrap();

        clock.advance(59);
        assert!(store.get("token").await.unwrap().is_some());

        clock.advance(1);
        assert_eq!(store.get("token").await.unwrap(), None);
        assert_eq!(store.ttl_remaining("token").await, None);
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let (store, clock) = store();
        store.set_with_expiry("short", "a", 10).await.unwrap();
        store.set_with_expiry("long", "b", 100).await.unwrap();

        clock.advance(50);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("b"));
    }
}
