//! Rate-limited, retrying convenience wrappers over a [`DataStore`].
//!
//! Reads retry up to `retries.read_max_retries` times, writes and RPCs up
//! to `retries.write_max_retries`. Each call consumes one admission from the
//! `(subject, endpoint)` quota, where the endpoint is the table or RPC name.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::backend::contracts::DataStore;
use crate::backend::types::MatchCriteria;
use crate::config::schema::{RateLimitConfig, RetryConfig};
use crate::error::AccessResult;
use crate::resilience::{ExecuteConfig, RateLimitRule, ResilientExecutor};
use crate::security::QuotaKey;

/// Data client routing every call through a [`ResilientExecutor`].
#[derive(Clone)]
pub struct DataClient {
    store: Arc<dyn DataStore>,
    executor: Arc<ResilientExecutor>,
    rate_limit: RateLimitConfig,
    retries: RetryConfig,
}

impl DataClient {
    pub fn new(
        store: Arc<dyn DataStore>,
        executor: Arc<ResilientExecutor>,
        rate_limit: RateLimitConfig,
        retries: RetryConfig,
    ) -> Self {
        Self {
            store,
            executor,
            rate_limit,
            retries,
        }
    }

    fn execute_config(&self, write: bool, endpoint: &str, subject: Option<&str>) -> ExecuteConfig {
        let max_retries = if write {
            self.retries.write_max_retries
        } else {
            self.retries.read_max_retries
        };

        let mut config = ExecuteConfig {
            max_retries,
            retry_delay_ms: self.retries.retry_delay_ms,
            max_delay_ms: self.retries.max_delay_ms,
            jitter: self.retries.jitter,
            rate_limit: None,
        };

        if self.rate_limit.enabled {
            let rule = self.rate_limit.rule_for(endpoint);
            config = config.with_rate_limit(RateLimitRule {
                key: QuotaKey::new(subject, endpoint),
                limit: rule.limit,
                window: Duration::from_secs(rule.window_secs),
            });
        }
        config
    }

    pub async fn select(&self, subject: Option<&str>, table: &str, projection: &str) -> AccessResult<Value> {
        let config = self.execute_config(false, table, subject);
        self.executor
            .execute(|| self.store.select(table, projection), &config)
            .await
    }

    pub async fn insert(&self, subject: Option<&str>, table: &str, row: Value) -> AccessResult<Value> {
        let config = self.execute_config(true, table, subject);
        self.executor
            .execute(|| self.store.insert(table, row.clone()), &config)
            .await
    }

    pub async fn update(
        &self,
        subject: Option<&str>,
        table: &str,
        patch: Value,
        criteria: &MatchCriteria,
    ) -> AccessResult<Value> {
        let config = self.execute_config(true, table, subject);
        self.executor
            .execute(|| self.store.update(table, patch.clone(), criteria), &config)
            .await
    }

    /// RPCs may have side effects and use write retry settings.
    pub async fn rpc(&self, subject: Option<&str>, function: &str, args: Value) -> AccessResult<Value> {
        let config = self.execute_config(true, function, subject);
        self.executor
            .execute(|| self.store.rpc(function, args.clone()), &config)
            .await
    }
}
