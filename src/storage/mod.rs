//! Quota counter storage.
//!
//! # Data Flow
//! ```text
//! RateLimiter
//!     → kv.rs (KeyValueStore capability: get / set / delete)
//!         → memory.rs (DashMap, tests and single-process use)
//!         → file.rs (JSON file, CLI and restarts)
//!     → clock.rs (window timestamps)
//! ```
//!
//! # Design Decisions
//! - Values are opaque strings; the limiter owns the record format
//! - No locking across calls; read-modify-write races are accepted

pub mod clock;
pub mod file;
pub mod kv;
pub mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileStore;
pub use kv::{KeyValueStore, StoreError, StoreResult};
pub use memory::MemoryStore;
