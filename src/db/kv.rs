//! Key-value persistence boundary.
//!
//! Records are whole JSON documents replaced on every write. There are no
//! partial updates and no schema versioning of the documents themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use super::DbPool;
use crate::{PostboxError, Result};

/// Durable string-to-document store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the document stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document stored under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Replace several documents at once. Either all writes land or none do.
    async fn put_many(&self, entries: &[(&str, &str)]) -> Result<()>;
}

/// Read and decode a JSON document.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON document.
pub async fn save_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw).await
}

const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value) VALUES (?, ?)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')";

/// SQLite-backed store using the `kv_store` table.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: DbPool,
}

impl SqliteKvStore {
    /// Create a store over an already-migrated pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PostboxError::Database(e.to_string()))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| PostboxError::Database(e.to_string()))?;
        Ok(())
    }

    async fn put_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(UPSERT_SQL)
                .bind(*key)
                .bind(*value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Volatile store for tests and throwaway instances.
///
/// Writes can be made to fail on demand to exercise persistence failures.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    records: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_prefix: Mutex<Option<String>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes to keys starting with `prefix` fail; `None` clears it.
    pub fn set_fail_prefix(&self, prefix: Option<&str>) {
        *self.fail_prefix.lock().unwrap_or_else(PoisonError::into_inner) =
            prefix.map(str::to_string);
    }

    fn check_write(&self, key: &str) -> Result<()> {
        let prefix_fails = self
            .fail_prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .is_some_and(|prefix| key.starts_with(prefix));

        if prefix_fails || self.fail_writes.load(Ordering::SeqCst) {
            return Err(PostboxError::Database(format!("write to {key} rejected")));
        }
        Ok(())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.check_write(key)?;
        self.records
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn put_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, _) in entries {
            self.check_write(key)?;
        }
        let mut records = self.records.write().await;
        for (key, value) in entries {
            records.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}
