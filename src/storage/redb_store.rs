// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent revocation store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `revocations`: token → JSON `{ value, expires_at }`
//!
//! redb has no native TTL, so each record carries its absolute expiry and
//! reads filter on it. All database work runs on the blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::{RevocationStore, StoreError, StoreResult};
use crate::auth::clock::Clock;

/// token → serialized [`Record`] (JSON bytes).
const REVOCATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("revocations");

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "revocations.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RedbStoreError {
    #[error("redb database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RedbStoreError> for StoreError {
    fn from(e: RedbStoreError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    value: String,
    expires_at: i64,
}

// =============================================================================
// RedbRevocationStore
// =============================================================================

/// redb-backed [`RevocationStore`].
pub struct RedbRevocationStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl RedbRevocationStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, RedbStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so read transactions never miss it
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REVOCATIONS)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            clock,
        })
    }

    /// Run blocking database work off the async executor.
    async fn blocking<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, RedbStoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || work(&db))
            .await
            .map_err(|e| StoreError::Backend(format!("blocking task failed: {e}")))?
            .map_err(StoreError::from)
    }
}

fn put(db: &Database, key: &str, record: &Record) -> Result<(), RedbStoreError> {
    let json = serde_json::to_vec(record)?;
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(REVOCATIONS)?;
        table.insert(key, json.as_slice())?;
    }
    write_txn.commit()?;
    Ok(())
}

fn fetch(db: &Database, key: &str) -> Result<Option<Record>, RedbStoreError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(REVOCATIONS)?;
    let record = match table.get(key)? {
        Some(value) => Some(serde_json::from_slice(value.value())?),
        None => None,
    };
    Ok(record)
}

fn purge(db: &Database, now: i64) -> Result<usize, RedbStoreError> {
    let write_txn = db.begin_write()?;
    let removed = {
        let mut table = write_txn.open_table(REVOCATIONS)?;

        let mut expired = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let record: Record = serde_json::from_slice(value.value())?;
            if record.expires_at <= now {
                expired.push(key.value().to_string());
            }
        }

        for key in &expired {
            table.remove(key.as_str())?;
        }
        expired.len()
    };
    write_txn.commit()?;
    Ok(removed)
}

#[async_trait]
impl RevocationStore for RedbRevocationStore {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let record = Record {
            value: value.to_string(),
            expires_at: self.clock.now().saturating_add(ttl),
        };
        let key = key.to_string();
        self.blocking(move |db| put(db, &key, &record)).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let key = key.to_string();
        let record = self.blocking(move |db| fetch(db, &key)).await?;
        Ok(record
            .filter(|record| record.expires_at > now)
            .map(|record| record.value))
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        self.blocking(move |db| purge(db, now)).await
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
