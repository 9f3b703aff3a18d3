//! # Identity Newtypes
//!
//! Subject identifiers are decentralized identifiers (`did:<method>:<id>`).
//! Validation happens once, at construction; everything downstream can
//! assume a well-formed DID.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::digest::{sha256_str, Digest256};
use crate::error::EtsError;

/// The holder a credential and its ACL entry belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate and wrap a DID string.
    ///
    /// Requires the `did:` scheme, a non-empty method, and a non-empty
    /// method-specific identifier. Surrounding whitespace is trimmed.
    pub fn new(did: impl Into<String>) -> Result<Self, EtsError> {
        let did = did.into();
        let did = did.trim();
        let mut parts = did.splitn(3, ':');
        let scheme = parts.next().unwrap_or_default();
        let method = parts.next().unwrap_or_default();
        let specific = parts.next().unwrap_or_default();
        if scheme != "did" || method.is_empty() || specific.is_empty() {
            return Err(EtsError::Validation(format!(
                "subject id must have the form did:<method>:<id>, got {did:?}"
            )));
        }
        if did.chars().any(char::is_whitespace) {
            return Err(EtsError::Validation(format!(
                "subject id must not contain whitespace: {did:?}"
            )));
        }
        Ok(Self(did.to_string()))
    }

    /// The DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The credential hash anchored for this subject: `SHA-256(did)`.
    pub fn vc_hash(&self) -> Digest256 {
        sha256_str(&self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = EtsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

/// Identifier of one verification session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_university_did() {
        let id = SubjectId::new("did:university:student1").unwrap();
        assert_eq!(id.as_str(), "did:university:student1");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = SubjectId::new("  did:university:student7 ").unwrap();
        assert_eq!(id.as_str(), "did:university:student7");
    }

    #[test]
    fn method_specific_id_may_contain_colons() {
        assert!(SubjectId::new("did:web:example.org:users:42").is_ok());
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "student1", "did:", "did:university", "did::x", "urn:x:y", "did:a:b c"] {
            assert!(SubjectId::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn serde_validates() {
        let ok: SubjectId = serde_json::from_str("\"did:university:student2\"").unwrap();
        assert_eq!(ok.to_string(), "did:university:student2");
        assert!(serde_json::from_str::<SubjectId>("\"student2\"").is_err());
    }

    #[test]
    fn vc_hash_is_sha256_of_did() {
        let id = SubjectId::new("did:university:student1").unwrap();
        assert_eq!(id.vc_hash(), sha256_str("did:university:student1"));
    }
}
