//! Process-wide service objects.
//!
//! Built once at startup from configuration and handed to callers by
//! reference; tests assemble isolated instances with their own store and
//! backend doubles.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{AuditLog, DataClient, DataStore, RemoteError, RestBackend, SecureFetch};
use crate::config::schema::{AccessConfig, StorageConfig, StorageKind};
use crate::disclosure::{DisclosureGate, GateSettings, RoleAllowlist};
use crate::resilience::{ConnectivityFlag, ResilientExecutor, RetryClassifier};
use crate::security::RateLimiter;
use crate::storage::{Clock, FileStore, KeyValueStore, MemoryStore, StoreError, SystemClock};

/// Errors raised while wiring services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("quota store: {0}")]
    Store(#[from] StoreError),

    #[error("backend: {0}")]
    Backend(#[from] RemoteError),
}

/// Open the quota store selected by configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    Ok(match config.kind {
        StorageKind::Memory => Arc::new(MemoryStore::new()),
        StorageKind::File => Arc::new(FileStore::open(&config.path).await?),
    })
}

/// The wired access layer.
pub struct Services {
    pub limiter: Arc<RateLimiter>,
    pub executor: Arc<ResilientExecutor>,
    pub client: DataClient,
    pub gate: DisclosureGate,
    pub connectivity: ConnectivityFlag,
}

impl Services {
    /// Build against the configured store and the REST backend.
    pub async fn from_config(config: &AccessConfig) -> Result<Self, ServiceError> {
        let store = open_store(&config.storage).await?;
        let backend = Arc::new(RestBackend::new(&config.backend)?);
        Ok(Self::assemble(config, store, Arc::new(SystemClock), backend))
    }

    /// Build from explicit parts.
    pub fn assemble<B>(
        config: &AccessConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        backend: Arc<B>,
    ) -> Self
    where
        B: DataStore + AuditLog + SecureFetch + 'static,
    {
        let limiter = Arc::new(
            RateLimiter::new(store)
                .with_clock(clock)
                .with_fail_open(config.rate_limit.fail_open),
        );

        let connectivity = ConnectivityFlag::default();
        let classifier = RetryClassifier::with_extra_codes(config.retries.extra_non_retryable_codes.iter().cloned());
        let executor = Arc::new(
            ResilientExecutor::new(limiter.clone(), classifier)
                .with_connectivity(Arc::new(connectivity.clone())),
        );

        let client = DataClient::new(
            backend.clone(),
            executor.clone(),
            config.rate_limit.clone(),
            config.retries.clone(),
        );

        let gate = DisclosureGate::new(
            RoleAllowlist::from(&config.disclosure.allowlist),
            backend.clone(),
            backend,
            executor.clone(),
        )
        .with_settings(GateSettings::from_config(
            &config.disclosure,
            &config.retries,
            config.rate_limit.enabled,
        ));

        tracing::info!(
            storage = ?config.storage.kind,
            rate_limit_enabled = config.rate_limit.enabled,
            fail_open = config.rate_limit.fail_open,
            "Access services initialized"
        );

        Self {
            limiter,
            executor,
            client,
            gate,
            connectivity,
        }
    }
}
