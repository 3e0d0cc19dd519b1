//! Rate-limited, retrying execution of remote operations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::backend::types::RemoteResult;
use crate::error::{AccessError, AccessResult};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::classifier::{RetryClassifier, Retryability};
use crate::resilience::connectivity::{Connectivity, ConnectivityFlag};
use crate::security::rate_limit::{QuotaKey, RateLimiter};

/// Quota consumed once per `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    pub key: QuotaKey,
    pub limit: u32,
    pub window: Duration,
}

/// Per-call execution settings.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base backoff delay.
    pub retry_delay_ms: u64,
    /// Optional cap for a single backoff delay. Unset, delays follow
    /// `retry_delay_ms * 2^attempt_index` exactly.
    pub max_delay_ms: Option<u64>,
    pub jitter: bool,
    /// `None` skips admission entirely.
    pub rate_limit: Option<RateLimitRule>,
}

impl ExecuteConfig {
    /// Settings for idempotent reads.
    pub fn read() -> Self {
        Self::default()
    }

    /// Settings for writes: a single retry, since a partially applied first
    /// attempt may already have had side effects.
    pub fn write() -> Self {
        Self {
            max_retries: 1,
            ..Self::default()
        }
    }

    pub fn with_rate_limit(mut self, rule: RateLimitRule) -> Self {
        self.rate_limit = Some(rule);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    fn endpoint(&self) -> &str {
        self.rate_limit
            .as_ref()
            .map(|rule| rule.key.endpoint.as_str())
            .unwrap_or("unlimited")
    }
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 1000,
            max_delay_ms: None,
            jitter: false,
            rate_limit: None,
        }
    }
}

/// Wraps remote operations with admission control and retries.
pub struct ResilientExecutor {
    limiter: Arc<RateLimiter>,
    classifier: RetryClassifier,
    connectivity: Arc<dyn Connectivity>,
}

impl ResilientExecutor {
    /// Executor that assumes the network is always up.
    pub fn new(limiter: Arc<RateLimiter>, classifier: RetryClassifier) -> Self {
        Self {
            limiter,
            classifier,
            connectivity: Arc::new(ConnectivityFlag::default()),
        }
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run `operation` until it succeeds, fails fatally, the network is
    /// known to be down, or retries run out.
    ///
    /// Attempts are strictly sequential. Backoff before retry `n + 1` is
    /// `retry_delay_ms * 2^n`.
    pub async fn execute<T, F, Fut>(&self, mut operation: F, config: &ExecuteConfig) -> AccessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let endpoint = config.endpoint().to_string();
        let span = tracing::debug_span!("execute", request_id = %Uuid::new_v4(), endpoint = %endpoint);

        async move {
            if let Some(rule) = &config.rate_limit {
                if !self.limiter.admit(&rule.key, rule.limit, rule.window).await {
                    tracing::warn!(key = %rule.key, limit = rule.limit, "Rate limit exceeded");
                    metrics::record_rate_limited(&endpoint);
                    return Err(AccessError::RateLimitExceeded {
                        key: rule.key.storage_key(),
                    });
                }
            }

            let mut attempt = 0u32;
            loop {
                metrics::record_attempt(&endpoint);
                let error = match operation().await {
                    Ok(value) => return Ok(value),
                    Err(error) => error,
                };

                if self.classifier.classify(&error) == Retryability::NonRetryable {
                    tracing::debug!(attempt, error = %error, "Non-retryable failure");
                    return Err(AccessError::NonRetryableRemoteError(error));
                }

                if attempt >= config.max_retries {
                    tracing::warn!(attempts = attempt + 1, error = %error, "Retries exhausted");
                    return Err(AccessError::TransientRemoteError(error));
                }

                if !self.connectivity.is_online() {
                    tracing::warn!(attempt, error = %error, "Offline, not retrying");
                    return Err(AccessError::TransientRemoteError(error));
                }

                let delay = calculate_backoff(
                    attempt,
                    config.retry_delay_ms,
                    config.max_delay_ms.unwrap_or(u64::MAX),
                    config.jitter,
                );
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Retrying after backoff");
                metrics::record_retry(&endpoint);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::RemoteError;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn executor() -> ResilientExecutor {
        let limiter = Arc::new(RateLimiter::new(Arc::new(MemoryStore::new())));
        ResilientExecutor::new(limiter, RetryClassifier::default())
    }

    #[test]
    fn test_config_defaults() {
        assert_eq!(ExecuteConfig::read().max_retries, 2);
        assert_eq!(ExecuteConfig::write().max_retries, 1);
        assert_eq!(ExecuteConfig::default().retry_delay_ms, 1000);
        assert_eq!(ExecuteConfig::default().endpoint(), "unlimited");
        assert_eq!(ExecuteConfig::default().max_delay_ms, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient() {
        let exec = executor();
        let calls = AtomicU32::new(0);

        let result = exec
            .execute(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(RemoteError::transport("reset"))
                        } else {
                            Ok(n)
                        }
                    }
                },
                &ExecuteConfig::read(),
            )
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let exec = executor();
        let calls = AtomicU32::new(0);

        let result: AccessResult<()> = exec
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(RemoteError::with_code("503", "unavailable")) }
                },
                &ExecuteConfig::read().with_max_retries(0),
            )
            .await;

        assert!(matches!(result, Err(AccessError::TransientRemoteError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
