//! Remote data store integration.
//!
//! # Data Flow
//! ```text
//! Caller
//!     → client.rs (DataClient: select / insert / update / rpc)
//!     → ResilientExecutor (admission, retries)
//!     → contracts.rs (DataStore / AuditLog / SecureFetch)
//!     → rest.rs (HTTP to the hosted store)
//! ```
//!
//! # Design Decisions
//! - The store itself (tables, row-level security, procedures) is external
//! - Every failure is a `RemoteError` value carrying the store's code

pub mod client;
pub mod contracts;
pub mod rest;
pub mod types;

pub use client::DataClient;
pub use contracts::{AuditLog, DataStore, SecureFetch};
pub use rest::RestBackend;
pub use types::{MatchCriteria, RemoteError, RemoteResult};
