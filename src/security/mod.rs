//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound operation:
//!     → rate_limit.rs (admit / deny per (subject, endpoint) quota)
//!     → resilience executor (attempt, retry)
//! ```
//!
//! # Design Decisions
//! - Abuse deterrent, not a hard cap: no cross-process coordination
//! - Fail open when the counter store breaks (configurable)

pub mod rate_limit;

pub use rate_limit::{QuotaKey, QuotaRecord, QuotaStatus, RateLimiter};
