//! # Selective Disclosure
//!
//! A [`DisclosureMask`] names the fields a verifier must not see. Masking
//! overwrites those values with [`REDACTION_SENTINEL`] and leaves every key
//! in place, so a record has the same shape at every disclosure level.
//!
//! Mask fields that the record does not carry are ignored; masking never
//! adds keys.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ets_core::{sha256_str, Digest256};

/// Replacement value for masked fields.
pub const REDACTION_SENTINEL: &str = "******";

/// Field names to redact, in the order the policy lists them.
///
/// Duplicates are dropped on construction; the first occurrence keeps its
/// position. Serializes as a JSON array in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct DisclosureMask(Vec<String>);

impl DisclosureMask {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !out.contains(&field) {
                out.push(field);
            }
        }
        Self(out)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The list as the registrar's `json.dumps` renders it: listing order,
    /// `", "` between items, and every character outside printable ASCII
    /// escaped as `\uXXXX`.
    pub fn registrar_json(&self) -> String {
        let mut out = String::from("[");
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            push_ascii_json_string(&mut out, field);
        }
        out.push(']');
        out
    }

    /// `SHA-256` of [`registrar_json`](Self::registrar_json).
    ///
    /// This is the `acl_hash` recorded in a transcript registration, so
    /// reordering the listed fields changes it.
    pub fn digest(&self) -> Digest256 {
        sha256_str(&self.registrar_json())
    }
}

impl From<Vec<String>> for DisclosureMask {
    fn from(fields: Vec<String>) -> Self {
        Self::new(fields)
    }
}

fn push_ascii_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // Writing to a String cannot fail.
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
        }
    }
    out.push('"');
}

/// A credential: field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRecord(BTreeMap<String, Value>);

impl CredentialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `field` is present and holds the sentinel.
    pub fn is_redacted(&self, field: &str) -> bool {
        matches!(self.0.get(field), Some(Value::String(s)) if s == REDACTION_SENTINEL)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for CredentialRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Apply `mask` to `record`.
pub fn mask(record: &CredentialRecord, mask: &DisclosureMask) -> CredentialRecord {
    let fields = record
        .0
        .iter()
        .map(|(k, v)| {
            let value = if mask.contains(k) {
                Value::String(REDACTION_SENTINEL.to_string())
            } else {
                v.clone()
            };
            (k.clone(), value)
        })
        .collect();
    CredentialRecord(fields)
}
