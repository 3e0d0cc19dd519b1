//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the access layer.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::disclosure::policy::{RecordType, SubjectRole};

/// Root configuration for the data-access layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// Quota counter storage.
    pub storage: StorageConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Sensitive field disclosure settings.
    pub disclosure: DisclosureConfig,

    /// Remote data store connection.
    pub backend: BackendConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Where quota counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    File,
}

/// Quota counter storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation.
    pub kind: StorageKind,

    /// JSON file used when `kind = "file"`.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            path: "quota_counters.json".to_string(),
        }
    }
}

/// Per-endpoint rate limit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointLimit {
    /// Admissions allowed per window.
    pub limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Admit requests when the counter store fails.
    pub fail_open: bool,

    /// Limit applied to endpoints without an override.
    pub default_limit: u32,

    /// Window applied to endpoints without an override, in seconds.
    pub default_window_secs: u64,

    /// Overrides keyed by endpoint name (table or RPC).
    pub endpoints: BTreeMap<String, EndpointLimit>,
}

impl RateLimitConfig {
    /// Resolve the rule for an endpoint.
    pub fn rule_for(&self, endpoint: &str) -> EndpointLimit {
        self.endpoints.get(endpoint).copied().unwrap_or(EndpointLimit {
            limit: self.default_limit,
            window_secs: self.default_window_secs,
        })
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_open: true,
            default_limit: 60,
            default_window_secs: 60,
            endpoints: BTreeMap::new(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt for reads.
    pub read_max_retries: u32,

    /// Retries after the first attempt for writes.
    pub write_max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_delay_ms: u64,

    /// Optional upper bound for a single backoff delay in milliseconds.
    /// When set it overrides `retry_delay_ms * 2^attempt_index` for late
    /// attempts.
    pub max_delay_ms: Option<u64>,

    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,

    /// Error codes treated as fatal in addition to the built-in set.
    pub extra_non_retryable_codes: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            read_max_retries: 2,
            write_max_retries: 1,
            retry_delay_ms: 1000,
            max_delay_ms: None,
            jitter: false,
            extra_non_retryable_codes: Vec::new(),
        }
    }
}

/// Disclosure gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisclosureConfig {
    /// Access type recorded by the audit RPC.
    pub access_type: String,

    /// Record types each role may reveal without owning the record.
    pub allowlist: BTreeMap<SubjectRole, Vec<RecordType>>,

    /// Retries for the secure fetch.
    pub fetch_max_retries: u32,

    /// Reveals allowed per subject per window.
    pub reveal_limit: u32,

    /// Reveal window in seconds.
    pub reveal_window_secs: u64,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        let mut allowlist = BTreeMap::new();
        allowlist.insert(
            SubjectRole::DeliveryProvider,
            vec![
                RecordType::Delivery,
                RecordType::DeliveryRequest,
                RecordType::DriverInfo,
            ],
        );
        allowlist.insert(
            SubjectRole::Supplier,
            vec![RecordType::PurchaseOrder, RecordType::Acknowledgement],
        );

        Self {
            access_type: "sensitive_view".to_string(),
            allowlist,
            fetch_max_retries: 2,
            reveal_limit: 30,
            reveal_window_secs: 60,
        }
    }
}

/// Remote data store connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the REST endpoint (e.g., "https://project.example.co").
    pub base_url: String,

    /// Public API key sent as `apikey` and bearer token.
    pub api_key: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// RPC used for audit logging.
    pub audit_rpc: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            audit_rpc: "log_sensitive_access".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
