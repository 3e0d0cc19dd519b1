//! File-backed key-value store.
//!
//! The whole map is kept in memory and written through to a JSON file on
//! every mutation, so counters survive CLI invocations and restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::storage::kv::{KeyValueStore, StoreResult};

/// A store persisted as a single JSON object.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store, loading existing entries if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    // The in-memory map only changes once the file write has succeeded.
    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("quota-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_persistence() {
        let path = temp_path();

        let store = FileStore::open(&path).await.unwrap();
        store.set("rate_limit_anonymous_orders", "{}".into()).await.unwrap();
        drop(store);

        let loaded = FileStore::open(&path).await.unwrap();
        assert_eq!(
            loaded.get("rate_limit_anonymous_orders").await.unwrap().as_deref(),
            Some("{}")
        );

        loaded.delete("rate_limit_anonymous_orders").await.unwrap();
        let reloaded = FileStore::open(&path).await.unwrap();
        assert!(reloaded.get("rate_limit_anonymous_orders").await.unwrap().is_none());

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_failed_write_leaves_entries_unchanged() {
        let path = std::env::temp_dir()
            .join(format!("quota-missing-{}", uuid::Uuid::new_v4()))
            .join("quota.json");

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.set("rate_limit_u1_orders", "{}".into()).await.is_err());
        assert!(store.get("rate_limit_u1_orders").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_closed_denial_leaves_no_counter() {
        use crate::security::{QuotaKey, RateLimiter};
        use std::sync::Arc;
        use std::time::Duration;

        let path = std::env::temp_dir()
            .join(format!("quota-missing-{}", uuid::Uuid::new_v4()))
            .join("quota.json");
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let limiter = RateLimiter::new(store.clone()).with_fail_open(false);
        let key = QuotaKey::new(Some("u1"), "orders");

        assert!(!limiter.admit(&key, 5, Duration::from_secs(60)).await);
        assert!(store.get(&key.storage_key()).await.unwrap().is_none());
        assert!(limiter.status(&key, 5).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = temp_path();
        std::fs::write(&path, b"not json").unwrap();

        assert!(FileStore::open(&path).await.is_err());

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
