//! Fixed-window rate limiting over a key-value store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::storage::{Clock, KeyValueStore, StoreError, SystemClock};

/// Identifies a quota: who is calling what.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuotaKey {
    /// Caller identity; `None` for unauthenticated callers.
    pub subject: Option<String>,
    /// Table, RPC or logical endpoint name.
    pub endpoint: String,
}

impl QuotaKey {
    pub fn new(subject: Option<&str>, endpoint: impl Into<String>) -> Self {
        Self {
            subject: subject.map(str::to_string),
            endpoint: endpoint.into(),
        }
    }

    /// Key under which the record is persisted.
    pub fn storage_key(&self) -> String {
        format!(
            "rate_limit_{}_{}",
            self.subject.as_deref().unwrap_or("anonymous"),
            self.endpoint
        )
    }
}

impl fmt::Display for QuotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRecord {
    pub count: u32,
    /// Milliseconds since the Unix epoch.
    pub window_start: u64,
}

impl QuotaRecord {
    fn fresh(now_ms: u64) -> Self {
        Self { count: 0, window_start: now_ms }
    }

    fn is_expired(&self, now_ms: u64, window: Duration) -> bool {
        now_ms.saturating_sub(self.window_start) > window.as_millis() as u64
    }
}

/// Snapshot returned by [`RateLimiter::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
}

/// Fixed-window limiter.
///
/// The read-modify-write in [`RateLimiter::admit`] is not atomic across
/// callers; two concurrent checks on the same key can both be admitted.
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    fail_open: bool,
}

impl RateLimiter {
    /// Create a fail-open limiter on the system clock.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            fail_open: true,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Choose what `admit` returns when the store fails.
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Decide whether one more request fits in the current window.
    pub async fn admit(&self, key: &QuotaKey, limit: u32, window: Duration) -> bool {
        match self.try_admit(key, limit, window).await {
            Ok(admitted) => admitted,
            Err(e) => {
                let policy = if self.fail_open { "fail_open" } else { "fail_closed" };
                tracing::warn!(key = %key, error = %e, policy, "Quota store failed during admission");
                metrics::record_store_error(policy);
                self.fail_open
            }
        }
    }

    async fn try_admit(&self, key: &QuotaKey, limit: u32, window: Duration) -> Result<bool, StoreError> {
        let storage_key = key.storage_key();
        let now = self.clock.now_ms();

        let mut record = match self.store.get(&storage_key).await? {
            Some(raw) => serde_json::from_str::<QuotaRecord>(&raw)?,
            None => QuotaRecord::fresh(now),
        };

        if record.is_expired(now, window) {
            record = QuotaRecord::fresh(now);
        }

        if record.count >= limit {
            tracing::debug!(key = %key, count = record.count, limit, "Admission denied");
            return Ok(false);
        }

        record.count += 1;
        self.store.set(&storage_key, serde_json::to_string(&record)?).await?;
        Ok(true)
    }

    /// Drop the record for `key`.
    pub async fn clear(&self, key: &QuotaKey) -> Result<(), StoreError> {
        self.store.delete(&key.storage_key()).await
    }

    /// Inspect the stored counter without touching it.
    pub async fn status(&self, key: &QuotaKey, limit: u32) -> Option<QuotaStatus> {
        let raw = match self.store.get(&key.storage_key()).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Quota store failed during status");
                return None;
            }
        };
        let record: QuotaRecord = serde_json::from_str(&raw).ok()?;

        Some(QuotaStatus {
            count: record.count,
            limit,
            remaining: limit.saturating_sub(record.count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ManualClock, MemoryStore};

    fn limiter() -> (RateLimiter, Arc<ManualClock>, MemoryStore) {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let limiter = RateLimiter::new(Arc::new(store.clone())).with_clock(clock.clone());
        (limiter, clock, store)
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            QuotaKey::new(Some("user-1"), "deliveries").storage_key(),
            "rate_limit_user-1_deliveries"
        );
        assert_eq!(
            QuotaKey::new(None, "deliveries").storage_key(),
            "rate_limit_anonymous_deliveries"
        );
    }

    #[tokio::test]
    async fn test_exactly_limit_admissions() {
        let (limiter, _, _) = limiter();
        let key = QuotaKey::new(Some("u"), "orders");
        let window = Duration::from_secs(60);

        for limit in [1u32, 3, 7] {
            limiter.clear(&key).await.unwrap();
            for _ in 0..limit {
                assert!(limiter.admit(&key, limit, window).await);
            }
            assert!(!limiter.admit(&key, limit, window).await);
        }
    }

    #[tokio::test]
    async fn test_denial_does_not_mutate() {
        let (limiter, _, _) = limiter();
        let key = QuotaKey::new(None, "orders");
        let window = Duration::from_secs(60);

        assert!(limiter.admit(&key, 1, window).await);
        assert!(!limiter.admit(&key, 1, window).await);
        assert!(!limiter.admit(&key, 1, window).await);

        let status = limiter.status(&key, 1).await.unwrap();
        assert_eq!(status, QuotaStatus { count: 1, limit: 1, remaining: 0 });
    }

    #[tokio::test]
    async fn test_window_reset() {
        let (limiter, clock, _) = limiter();
        let key = QuotaKey::new(Some("u"), "orders");
        let window = Duration::from_secs(60);

        assert!(limiter.admit(&key, 2, window).await);
        assert!(limiter.admit(&key, 2, window).await);
        assert!(!limiter.admit(&key, 2, window).await);

        // Exactly one window later is still inside it.
        clock.advance(window);
        assert!(!limiter.admit(&key, 2, window).await);

        clock.advance(Duration::from_millis(1));
        assert!(limiter.admit(&key, 2, window).await);
        assert_eq!(limiter.status(&key, 2).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_status_and_clear() {
        let (limiter, _, store) = limiter();
        let key = QuotaKey::new(Some("u"), "orders");

        assert!(limiter.status(&key, 5).await.is_none());
        assert!(store.is_empty());

        limiter.admit(&key, 5, Duration::from_secs(1)).await;
        limiter.admit(&key, 5, Duration::from_secs(1)).await;
        assert_eq!(limiter.status(&key, 5).await.unwrap().remaining, 3);

        limiter.clear(&key).await.unwrap();
        assert!(limiter.status(&key, 5).await.is_none());
    }

    #[tokio::test]
    async fn test_record_serialization() {
        let (limiter, _, store) = limiter();
        let key = QuotaKey::new(Some("u"), "orders");
        limiter.admit(&key, 5, Duration::from_secs(1)).await;

        let raw = store.get("rate_limit_u_orders").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["windowStart"], 1_700_000_000_000u64);
    }

    #[tokio::test]
    async fn test_corrupt_record_fails_open() {
        let (limiter, _, store) = limiter();
        let key = QuotaKey::new(Some("u"), "orders");
        store.set(&key.storage_key(), "garbage".into()).await.unwrap();

        assert!(limiter.admit(&key, 0, Duration::from_secs(1)).await);

        let closed = RateLimiter::new(Arc::new(store)).with_fail_open(false);
        assert!(!closed.admit(&key, 10, Duration::from_secs(1)).await);
    }
}
