//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Remote operation:
//!     → executor.rs (admission via RateLimiter, once per call)
//!     → attempt
//!     → On failure: classifier.rs (retryable?)
//!         → connectivity.rs (offline? abort)
//!         → backoff.rs (wait base * 2^n, then retry)
//! ```
//!
//! # Design Decisions
//! - Timeouts are ordinary retryable failures
//! - Writes retry at most once by default
//! - Errors are returned as values, never panics

pub mod backoff;
pub mod classifier;
pub mod connectivity;
pub mod executor;

pub use classifier::{RetryClassifier, Retryability, NON_RETRYABLE_CODES};
pub use connectivity::{Connectivity, ConnectivityFlag};
pub use executor::{ExecuteConfig, RateLimitRule, ResilientExecutor};
