//! Authorization-checked, audited disclosure of sensitive fields.
//!
//! # Sequence
//! ```text
//! reveal(policy, record)
//!     → local check (admin / owner / role allowlist)      deny → AccessDenied, nothing else
//!     → audit log_access(record_id, access_type)          failure → logged, audit_logged = false
//!     → secure fetch via ResilientExecutor                zero rows → AccessDenied
//!     → attach real values, revealed = true
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::backend::contracts::{AuditLog, SecureFetch};
use crate::config::schema::{DisclosureConfig, RetryConfig};
use crate::disclosure::policy::{DisclosurePolicy, RoleAllowlist};
use crate::disclosure::record::SensitiveRecord;
use crate::error::{AccessError, AccessResult, DenialReason};
use crate::observability::metrics;
use crate::resilience::{ExecuteConfig, RateLimitRule, ResilientExecutor};
use crate::security::QuotaKey;

/// Outcome of a successful reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealReceipt {
    /// Whether the audit call succeeded. Reveals proceed either way.
    pub audit_logged: bool,
    /// Fields that received a real value.
    pub fields_revealed: usize,
}

/// Tunables for the gate.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub access_type: String,
    pub fetch: ExecuteConfig,
    /// `(limit, window)` per subject, `None` to disable.
    pub reveal_quota: Option<(u32, Duration)>,
}

impl GateSettings {
    pub fn from_config(disclosure: &DisclosureConfig, retries: &RetryConfig, rate_limited: bool) -> Self {
        Self {
            access_type: disclosure.access_type.clone(),
            fetch: ExecuteConfig {
                max_retries: disclosure.fetch_max_retries,
                retry_delay_ms: retries.retry_delay_ms,
                max_delay_ms: retries.max_delay_ms,
                jitter: retries.jitter,
                rate_limit: None,
            },
            reveal_quota: rate_limited.then(|| {
                (
                    disclosure.reveal_limit,
                    Duration::from_secs(disclosure.reveal_window_secs),
                )
            }),
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self::from_config(&DisclosureConfig::default(), &RetryConfig::default(), true)
    }
}

/// Gate in front of the secure-fetch RPCs.
pub struct DisclosureGate {
    allowlist: RoleAllowlist,
    audit: Arc<dyn AuditLog>,
    fetcher: Arc<dyn SecureFetch>,
    executor: Arc<ResilientExecutor>,
    settings: GateSettings,
}

impl DisclosureGate {
    pub fn new(
        allowlist: RoleAllowlist,
        audit: Arc<dyn AuditLog>,
        fetcher: Arc<dyn SecureFetch>,
        executor: Arc<ResilientExecutor>,
    ) -> Self {
        Self {
            allowlist,
            audit,
            fetcher,
            executor,
            settings: GateSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GateSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Advisory local check; the backend has the final word.
    pub fn can_access(&self, policy: &DisclosurePolicy, record: &SensitiveRecord) -> bool {
        policy.record_type == record.record_type() && self.allowlist.can_access(policy)
    }

    /// Reveal the real values of `record`'s sensitive fields.
    pub async fn reveal(
        &self,
        policy: &DisclosurePolicy,
        record: &mut SensitiveRecord,
    ) -> AccessResult<RevealReceipt> {
        let record_type = record.record_type();
        let record_id = record.record_id().to_string();

        if !self.can_access(policy, record) {
            tracing::warn!(
                record_type = %record_type,
                role = ?policy.subject_role,
                "Disclosure denied by policy"
            );
            metrics::record_reveal(record_type.as_str(), "denied");
            return Err(AccessError::AccessDenied {
                record_type,
                reason: DenialReason::Policy,
            });
        }

        let audit_logged = match self
            .audit
            .log_access(&record_id, &self.settings.access_type)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    record_id = %record_id,
                    record_type = %record_type,
                    error = %e,
                    "Audit log failed, continuing with reveal"
                );
                metrics::record_audit_failure(record_type.as_str());
                false
            }
        };

        let mut fetch = self.settings.fetch.clone();
        if let Some((limit, window)) = self.settings.reveal_quota {
            fetch = fetch.with_rate_limit(RateLimitRule {
                key: QuotaKey::new(policy.subject_id.as_deref(), format!("reveal_{record_type}")),
                limit,
                window,
            });
        }

        let rpc = record_type.secure_rpc();
        let row = match self
            .executor
            .execute(|| self.fetcher.fetch_secure(rpc, &record_id), &fetch)
            .await
        {
            Ok(row) => row,
            Err(e) => {
                metrics::record_reveal(record_type.as_str(), "error");
                return Err(e);
            }
        };

        let Some(row) = row else {
            tracing::warn!(record_id = %record_id, record_type = %record_type, "Secure fetch returned no row");
            metrics::record_reveal(record_type.as_str(), "denied");
            return Err(AccessError::AccessDenied {
                record_type,
                reason: DenialReason::Backend,
            });
        };

        let fields_revealed = record.attach(&row);
        metrics::record_reveal(record_type.as_str(), "revealed");
        tracing::info!(
            record_id = %record_id,
            record_type = %record_type,
            fields_revealed,
            audit_logged,
            "Sensitive fields revealed"
        );

        Ok(RevealReceipt {
            audit_logged,
            fields_revealed,
        })
    }

    /// Return the record to its masked state. No backend call.
    pub fn hide(&self, record: &mut SensitiveRecord) {
        record.hide();
    }
}
