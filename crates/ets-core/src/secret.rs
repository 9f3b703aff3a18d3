//! # Verifier Secrets
//!
//! The attribute a verifier (employer) proves knowledge of, e.g. a contact
//! email. The secret is normalized (trimmed, lowercased) once at
//! construction so that the hash registered in an ACL and the hash computed
//! at proof time agree.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::digest::{sha256_str, Digest256};
use crate::error::EtsError;

/// A verifier's secret attribute. Zeroized on drop, never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VerifierSecret(String);

impl VerifierSecret {
    /// Normalize and wrap a secret. Empty secrets are rejected.
    pub fn new(raw: &str) -> Result<Self, EtsError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(EtsError::Validation("verifier secret is empty".into()));
        }
        Ok(Self(normalized))
    }

    /// `H(secret)`: the value stored as `authorized_secret_hash`.
    pub fn digest(&self) -> Digest256 {
        sha256_str(&self.0)
    }

    /// Expose the normalized secret text.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerifierSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerifierSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_matches_registered_hash() {
        let a = VerifierSecret::new("  HR1@Gmail.com ").unwrap();
        let b = VerifierSecret::new("hr1@gmail.com").unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest(), sha256_str("hr1@gmail.com"));
    }

    #[test]
    fn debug_is_redacted() {
        let s = VerifierSecret::new("hr1@gmail.com").unwrap();
        assert!(!format!("{s:?}").contains("gmail"));
    }

    #[test]
    fn rejects_blank() {
        assert!(VerifierSecret::new("   ").is_err());
    }
}
