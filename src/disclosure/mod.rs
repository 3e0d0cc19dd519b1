//! Sensitive field disclosure.
//!
//! # Data Flow
//! ```text
//! SensitiveRecord (masked via masking.rs, no network)
//!     → gate.rs reveal(policy)
//!         → policy.rs (admin / owner / allowlist)
//!         → audit RPC
//!         → secure fetch (record type → RPC table)
//!     → record.rs (real values attached; hide() drops them)
//! ```
//!
//! # Design Decisions
//! - Masking is display policy, not security
//! - The secure fetch is the authoritative permission check
//! - Audit is best-effort and reported on the receipt

pub mod gate;
pub mod masking;
pub mod policy;
pub mod record;

pub use gate::{DisclosureGate, GateSettings, RevealReceipt};
pub use masking::{mask_address, mask_name, mask_phone, mask_reference, FieldKind};
pub use policy::{DisclosurePolicy, RecordType, RoleAllowlist, SubjectRole};
pub use record::{MaskedField, SensitiveRecord};
