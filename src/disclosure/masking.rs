//! Deterministic partial redaction for default display.
//!
//! Lengths count Unicode scalar values, so multibyte names never split.

use serde::{Deserialize, Serialize};

/// Masking rule to apply to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Phone,
    Name,
    Address,
    Reference,
}

impl FieldKind {
    pub fn mask(&self, value: &str) -> String {
        match self {
            FieldKind::Phone => mask_phone(value),
            FieldKind::Name => mask_name(value),
            FieldKind::Address => mask_address(value),
            FieldKind::Reference => mask_reference(value),
        }
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn first_chars(value: &str, n: usize) -> String {
    value.chars().take(n).collect()
}

fn last_chars(value: &str, n: usize) -> String {
    let skip = char_len(value).saturating_sub(n);
    value.chars().skip(skip).collect()
}

/// `0712345678` → `***-***-5678`.
pub fn mask_phone(phone: &str) -> String {
    if char_len(phone) < 4 {
        return phone.to_string();
    }
    format!("***-***-{}", last_chars(phone, 4))
}

/// `Jonathan` → `J***n`.
pub fn mask_name(name: &str) -> String {
    if char_len(name) < 3 {
        return name.to_string();
    }
    format!("{}***{}", first_chars(name, 1), last_chars(name, 1))
}

/// `12 Kenyatta Ave, Westlands, Nairobi` → `12 ***, Nairobi`.
pub fn mask_address(address: &str) -> String {
    if char_len(address) < 10 {
        return address.to_string();
    }

    let segments: Vec<&str> = address.split(',').collect();
    match segments.as_slice() {
        [first, .., last] => format!("{}***, {}", first_chars(first, 3), last.trim()),
        _ => format!("{}***", first_chars(address, 6)),
    }
}

/// `TXN-99812345` → `***2345`.
pub fn mask_reference(reference: &str) -> String {
    if char_len(reference) < 4 {
        return reference.to_string();
    }
    format!("***{}", last_chars(reference, 4))
}
