//! Resilient, policy-gated data access for the materials marketplace.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ DataClient ──▶ ResilientExecutor ──▶ DataStore (REST)
//!                                 │      │
//!                                 │      └─▶ RetryClassifier / backoff / connectivity
//!                                 ▼
//!                            RateLimiter ──▶ KeyValueStore (memory | file)
//!
//!   caller ──▶ DisclosureGate ──▶ policy check ──▶ AuditLog ──▶ SecureFetch (via executor)
//! ```

pub mod backend;
pub mod config;
pub mod disclosure;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod services;
pub mod storage;

pub use config::AccessConfig;
pub use error::{AccessError, AccessResult};
pub use services::Services;
