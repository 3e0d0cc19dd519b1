//! Records carrying masked sensitive fields.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::disclosure::masking::FieldKind;
use crate::disclosure::policy::RecordType;

/// A sensitive value with a masked and (after reveal) a real projection.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskedField {
    kind: FieldKind,
    masked: String,
    real: Option<String>,
}

impl MaskedField {
    /// Mask a locally known value. The raw value is consumed, not kept.
    pub fn from_value(kind: FieldKind, value: String) -> Self {
        Self {
            kind,
            masked: kind.mask(&value),
            real: None,
        }
    }

    /// Wrap a value that arrived already masked.
    pub fn from_masked(kind: FieldKind, masked: impl Into<String>) -> Self {
        Self {
            kind,
            masked: masked.into(),
            real: None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn real(&self) -> Option<&str> {
        self.real.as_deref()
    }
}

impl fmt::Debug for MaskedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedField")
            .field("kind", &self.kind)
            .field("masked", &self.masked)
            .field("real", &self.real.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A record whose sensitive fields are masked until revealed.
#[derive(Debug, Clone)]
pub struct SensitiveRecord {
    record_id: String,
    record_type: RecordType,
    fields: BTreeMap<String, MaskedField>,
    revealed: bool,
}

impl SensitiveRecord {
    pub fn new(record_id: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            record_id: record_id.into(),
            record_type,
            fields: BTreeMap::new(),
            revealed: false,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: MaskedField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn field(&self, name: &str) -> Option<&MaskedField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &MaskedField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The projection to show: real when revealed, masked otherwise.
    pub fn display(&self, name: &str) -> Option<&str> {
        let field = self.fields.get(name)?;
        match (&field.real, self.revealed) {
            (Some(real), true) => Some(real.as_str()),
            _ => Some(field.masked.as_str()),
        }
    }

    /// Discard real values. Purely local.
    pub fn hide(&mut self) {
        for field in self.fields.values_mut() {
            field.real = None;
        }
        self.revealed = false;
    }

    /// Copy real values from an authorized secure-fetch row onto matching
    /// fields. Returns how many fields received a value.
    pub(crate) fn attach(&mut self, row: &Map<String, Value>) -> usize {
        let mut attached = 0;
        for (name, field) in self.fields.iter_mut() {
            let real = match row.get(name) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
            if real.is_some() {
                attached += 1;
            }
            field.real = real;
        }
        self.revealed = true;
        attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> SensitiveRecord {
        SensitiveRecord::new("del-1", RecordType::Delivery)
            .with_field("driver_phone", MaskedField::from_value(FieldKind::Phone, "0712345678".into()))
            .with_field("driver_name", MaskedField::from_masked(FieldKind::Name, "J***n"))
    }

    #[test]
    fn test_masked_by_default() {
        let record = record();
        assert!(!record.is_revealed());
        assert_eq!(record.display("driver_phone"), Some("***-***-5678"));
        assert!(record.field("driver_phone").unwrap().real().is_none());
        assert!(record.display("missing").is_none());
    }

    #[test]
    fn test_attach_and_hide() {
        let mut record = record();
        let row = json!({"driver_phone": "0712345678", "driver_name": "Jonathan", "other": 1});

        let attached = record.attach(row.as_object().unwrap());
        assert_eq!(attached, 2);
        assert_eq!(record.display("driver_name"), Some("Jonathan"));

        record.hide();
        assert!(!record.is_revealed());
        assert_eq!(record.display("driver_name"), Some("J***n"));
        assert!(record.fields().all(|(_, f)| f.real().is_none()));
    }

    #[test]
    fn test_debug_redacts_real() {
        let mut record = record();
        record.attach(json!({"driver_phone": "0712345678"}).as_object().unwrap());

        let debug = format!("{:?}", record.field("driver_phone").unwrap());
        assert!(!debug.contains("0712345678"));
        assert!(debug.contains("<redacted>"));
    }
}
