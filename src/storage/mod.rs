// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Revocation Store
//!
//! Key-value storage with per-key expiry, used for two kinds of record:
//!
//! - **Refresh registrations**: `refresh token → subject`, written when a
//!   refresh token is issued and expiring together with the token.
//! - **Blacklist entries**: `token → "blacklist"`, written on explicit
//!   revocation (logout) and expiring when the token would anyway be
//!   rejected as expired.
//!
//! The contract is deliberately small: an atomic per-key `get` and
//! `set_with_expiry`. No compare-and-swap, no multi-key transactions. An
//! expired record is indistinguishable from an absent one.
//!
//! ## Backends
//!
//! - [`InMemoryRevocationStore`] - process-local, for single-instance and tests
//! - [`RedbRevocationStore`] - embedded redb database under `DATA_DIR`
//!
//! Every call made by the auth core goes through [`RevocationClient`], which
//! bounds it with a timeout so an unresponsive store surfaces as
//! [`StoreError::Timeout`] instead of hanging a request.

pub mod memory;
pub mod redb_store;
pub mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use memory::InMemoryRevocationStore;
pub use redb_store::RedbRevocationStore;
pub use sweeper::ExpirySweeper;

/// Reserved value marking a token as explicitly revoked.
///
/// Subject identifiers must never equal this string; issuance rejects it.
pub const BLACKLIST_SENTINEL: &str = "blacklist";

/// Errors raised by a revocation store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store did not answer within the configured bound
    #[error("revocation store timed out after {0:?}")]
    Timeout(Duration),

    /// The backend reported a failure
    #[error("revocation store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Expiring key-value capability backing refresh and blacklist records.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous record, for
    /// `ttl_secs` seconds.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    /// Fetch the live record for `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Drop expired records, returning how many were removed.
    ///
    /// Stores that expire entries on their own keep the default.
    async fn purge_expired(&self) -> StoreResult<usize> {
        Ok(0)
    }

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Timeout-bounded handle to a shared [`RevocationStore`].
#[derive(Clone)]
pub struct RevocationClient {
    store: Arc<dyn RevocationStore>,
    timeout: Duration,
}

impl RevocationClient {
    pub fn new(store: Arc<dyn RevocationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        tokio::time::timeout(self.timeout, self.store.set_with_expiry(key, value, ttl_secs))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        tokio::time::timeout(self.timeout, self.store.get(key))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
