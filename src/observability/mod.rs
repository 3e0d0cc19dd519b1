//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RateLimiter / ResilientExecutor / DisclosureGate produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stderr log output
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Unmasked field values never reach logs or metric labels
//! - Audit delivery failures are reported here, not raised to callers

pub mod logging;
pub mod metrics;
