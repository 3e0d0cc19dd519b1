//! Errors surfaced to callers of the access layer.

use thiserror::Error;

use crate::backend::types::RemoteError;
use crate::disclosure::policy::RecordType;

/// Why a disclosure was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The local role/ownership check failed.
    Policy,
    /// The backend returned no row for the secure fetch.
    Backend,
}

/// Errors that can occur while executing or disclosing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Admission was denied by the rate limiter.
    #[error("rate limit exceeded for {key}")]
    RateLimitExceeded { key: String },

    /// Permission, uniqueness or integrity violation; never retried.
    #[error("remote operation rejected: {0}")]
    NonRetryableRemoteError(RemoteError),

    /// Network or server hiccup that survived every retry.
    #[error("remote operation failed: {0}")]
    TransientRemoteError(RemoteError),

    /// The caller may not reveal this record.
    #[error("access denied to {record_type} ({reason:?})")]
    AccessDenied {
        record_type: RecordType,
        reason: DenialReason,
    },
}

impl AccessError {
    /// Text suitable for showing to the end user. Each kind points at a
    /// different remedy.
    pub fn user_message(&self) -> &'static str {
        match self {
            AccessError::RateLimitExceeded { .. } => {
                "Too many requests. Please wait a moment and try again later."
            }
            AccessError::NonRetryableRemoteError(_) => {
                "This request cannot be completed. Contact support if the problem persists."
            }
            AccessError::TransientRemoteError(_) => {
                "A temporary network problem occurred. Please retry now."
            }
            AccessError::AccessDenied { .. } => {
                "You do not have permission to view these details. Contact support if you believe this is wrong."
            }
        }
    }
}

/// Result type for access-layer operations.
pub type AccessResult<T> = Result<T, AccessError>;
