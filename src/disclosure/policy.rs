//! Who may reveal what.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Marketplace role of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRole {
    Guest,
    Builder,
    Supplier,
    DeliveryProvider,
    Admin,
}

/// Kind of record holding sensitive fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Delivery,
    DeliveryRequest,
    PurchaseOrder,
    Acknowledgement,
    DriverInfo,
}

impl RecordType {
    pub const ALL: [RecordType; 5] = [
        RecordType::Delivery,
        RecordType::DeliveryRequest,
        RecordType::PurchaseOrder,
        RecordType::Acknowledgement,
        RecordType::DriverInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Delivery => "delivery",
            RecordType::DeliveryRequest => "delivery_request",
            RecordType::PurchaseOrder => "purchase_order",
            RecordType::Acknowledgement => "acknowledgement",
            RecordType::DriverInfo => "driver_info",
        }
    }

    /// RPC returning the unmasked row for this record type.
    ///
    /// Driver contact details are stored on the delivery row.
    pub fn secure_rpc(&self) -> &'static str {
        match self {
            RecordType::Delivery | RecordType::DriverInfo => "get_delivery_secure",
            RecordType::DeliveryRequest => "get_delivery_request_secure",
            RecordType::PurchaseOrder => "get_purchase_order_secure",
            RecordType::Acknowledgement => "get_acknowledgement_secure",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosurePolicy {
    pub subject_role: SubjectRole,
    pub is_owner: bool,
    pub record_type: RecordType,
    /// Rate-limit subject for the secure fetch.
    pub subject_id: Option<String>,
}

impl DisclosurePolicy {
    pub fn new(subject_role: SubjectRole, is_owner: bool, record_type: RecordType) -> Self {
        Self {
            subject_role,
            is_owner,
            record_type,
            subject_id: None,
        }
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }
}

/// Record types a role may reveal without owning the record.
#[derive(Debug, Clone, Default)]
pub struct RoleAllowlist {
    grants: BTreeMap<SubjectRole, BTreeSet<RecordType>>,
}

impl RoleAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, role: SubjectRole, record_type: RecordType) -> Self {
        self.grants.entry(role).or_default().insert(record_type);
        self
    }

    pub fn allows(&self, role: SubjectRole, record_type: RecordType) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|types| types.contains(&record_type))
    }

    /// Local, advisory check. The secure fetch is authoritative.
    pub fn can_access(&self, policy: &DisclosurePolicy) -> bool {
        policy.subject_role == SubjectRole::Admin
            || policy.is_owner
            || self.allows(policy.subject_role, policy.record_type)
    }
}

impl From<&BTreeMap<SubjectRole, Vec<RecordType>>> for RoleAllowlist {
    fn from(map: &BTreeMap<SubjectRole, Vec<RecordType>>) -> Self {
        let grants = map
            .iter()
            .map(|(role, types)| (*role, types.iter().copied().collect()))
            .collect();
        Self { grants }
    }
}
