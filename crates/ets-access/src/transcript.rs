//! # Transcript Registration and Disclosure Tokens
//!
//! A [`TranscriptRegistration`] is what the ledger anchors for a subject:
//! the hash of the disclosure policy, the credential hash, and the
//! registration's expiry. A [`DisclosureToken`] is the bundle handed to a
//! verifier so it can check, before anything else, that the secret it
//! holds is the authorized one and that the credential it was shown is the
//! one on file.

use serde::{Deserialize, Serialize};

use ets_core::{Digest256, SubjectId, Timestamp, VerifierSecret};

use crate::acl::AclEntry;

/// Ledger-anchored registration of one subject's transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRegistration {
    pub subject_id: SubjectId,
    /// [`DisclosureMask::digest`](crate::DisclosureMask::digest) of the policy.
    pub acl_hash: Digest256,
    pub vc_hash: Digest256,
    pub expiration: Timestamp,
}

impl TranscriptRegistration {
    /// Registration for `entry`'s policy and the subject's credential hash.
    pub fn for_entry(entry: &AclEntry, vc_hash: Digest256) -> Self {
        Self {
            subject_id: entry.subject_id.clone(),
            acl_hash: entry.disclosure_mask.digest(),
            vc_hash,
            expiration: entry.expiration,
        }
    }

    /// Both hashes match and the registration has not expired.
    pub fn matches(&self, acl_hash: &Digest256, vc_hash: &Digest256, now: Timestamp) -> bool {
        &self.acl_hash == acl_hash && &self.vc_hash == vc_hash && !self.expiration.is_passed_at(now)
    }
}

/// Token presented to a verifier alongside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureToken {
    pub subject_id: SubjectId,
    pub acl_hash: Digest256,
    pub vc_hash: Digest256,
    pub validity: Timestamp,
    pub verifier_secret_hash: Digest256,
    /// Credential hash in the off-ledger store.
    pub stored_vc_hash: Digest256,
    /// Credential hash in the verifiable presentation.
    pub presented_vc_hash: Digest256,
}

impl DisclosureToken {
    pub fn from_entry(entry: &AclEntry, stored_vc_hash: Digest256, presented_vc_hash: Digest256) -> Self {
        Self {
            subject_id: entry.subject_id.clone(),
            acl_hash: entry.disclosure_mask.digest(),
            vc_hash: entry.subject_id.vc_hash(),
            validity: entry.expiration,
            verifier_secret_hash: entry.authorized_secret_hash,
            stored_vc_hash,
            presented_vc_hash,
        }
    }

    /// Hash-reveal comparison of `secret` against the authorized hash.
    pub fn check_secret(&self, secret: &VerifierSecret) -> bool {
        secret.digest() == self.verifier_secret_hash
    }

    /// The presented credential is the stored one.
    pub fn check_vc_consistency(&self) -> bool {
        self.stored_vc_hash == self.presented_vc_hash
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        !self.validity.is_passed_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disclosure::DisclosureMask;
    use ets_core::sha256_str;

    fn entry() -> AclEntry {
        AclEntry::new(
            SubjectId::new("did:university:student1").unwrap(),
            &VerifierSecret::new("hr1@gmail.com").unwrap(),
            DisclosureMask::new(["religion", "sex"]),
            Timestamp::from_epoch_secs(2_000),
        )
    }

    #[test]
    fn registration_matches_its_own_hashes() {
        let e = entry();
        let vc = e.subject_id.vc_hash();
        let reg = TranscriptRegistration::for_entry(&e, vc);
        let acl_hash = e.disclosure_mask.digest();
        assert!(reg.matches(&acl_hash, &vc, Timestamp::from_epoch_secs(2_000)));
        assert!(!reg.matches(&acl_hash, &vc, Timestamp::from_epoch_secs(2_001)));
        assert!(!reg.matches(&acl_hash, &sha256_str("other"), Timestamp::from_epoch_secs(0)));
    }

    #[test]
    fn policy_change_changes_acl_hash() {
        let mut e = entry();
        let before = TranscriptRegistration::for_entry(&e, e.subject_id.vc_hash());
        e.disclosure_mask = DisclosureMask::new(["religion"]);
        let after = TranscriptRegistration::for_entry(&e, e.subject_id.vc_hash());
        assert_ne!(before.acl_hash, after.acl_hash);

        e.disclosure_mask = DisclosureMask::new(["sex", "religion"]);
        let reordered = TranscriptRegistration::for_entry(&e, e.subject_id.vc_hash());
        assert_ne!(before.acl_hash, reordered.acl_hash);
    }

    #[test]
    fn token_checks() {
        let e = entry();
        let stored = e.subject_id.vc_hash();
        let token = DisclosureToken::from_entry(&e, stored, stored);
        assert!(token.check_secret(&VerifierSecret::new(" HR1@gmail.com").unwrap()));
        assert!(!token.check_secret(&VerifierSecret::new("hr2@gmail.com").unwrap()));
        assert!(token.check_vc_consistency());
        assert!(token.is_valid_at(Timestamp::from_epoch_secs(1_999)));

        let forged = DisclosureToken::from_entry(&e, stored, sha256_str("forged"));
        assert!(!forged.check_vc_consistency());
    }

    #[test]
    fn token_serializes_hex_digests() {
        let e = entry();
        let token = DisclosureToken::from_entry(&e, e.subject_id.vc_hash(), e.subject_id.vc_hash());
        let v = serde_json::to_value(&token).unwrap();
        assert_eq!(v["vc_hash"], serde_json::json!(sha256_str("did:university:student1").to_hex()));
        assert_eq!(v["validity"], serde_json::json!(2_000));
    }
}
