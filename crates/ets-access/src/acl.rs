//! # Access Control List
//!
//! Each subject has at most one active entry. Issuing a new entry retires
//! the previous one by setting `valid = false`; retired entries stay in the
//! subject's history and are never removed.
//!
//! ## Entitlement check
//!
//! Evaluated in this order, first failure wins:
//!
//! 1. no entry for the subject: `NotFound`
//! 2. `valid == false` or `now > expiration`: `Expired`
//! 3. `H(claimed secret) != authorized_secret_hash`: `SecretMismatch`
//!
//! The freshness part (steps 1 and 2) is available on its own as
//! [`AclEntry::check_freshness`] for the zero-knowledge path, where the
//! verifier never sees the secret hash comparison.
//!
//! ## Wire format
//!
//! Entries deserialize from the field names used by existing ACL files
//! (`student_did`, `employer_hashed_email`, `selective_disclosure`,
//! `isValid`) as well as their own names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ets_core::{Digest256, SubjectId, Timestamp, VerifierSecret};

use crate::disclosure::DisclosureMask;

/// Why an entitlement check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    /// No ACL entry exists for the subject.
    #[error("no ACL entry for {0}")]
    NotFound(SubjectId),

    /// The entry was retired or its expiration has passed.
    #[error("ACL entry for {subject} is expired or retired (expiration {expiration})")]
    Expired {
        /// The subject.
        subject: SubjectId,
        /// The entry's expiration.
        expiration: Timestamp,
    },

    /// The presented secret does not hash to the authorized value.
    #[error("secret does not match the authorized verifier for {0}")]
    SecretMismatch(SubjectId),
}

fn default_valid() -> bool {
    true
}

/// One disclosure policy for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    #[serde(alias = "student_did")]
    pub subject_id: SubjectId,
    /// `SHA-256` of the normalized verifier secret.
    #[serde(alias = "employer_hashed_email")]
    pub authorized_secret_hash: Digest256,
    /// Fields hidden from the verifier.
    #[serde(alias = "selective_disclosure", default)]
    pub disclosure_mask: DisclosureMask,
    pub expiration: Timestamp,
    #[serde(alias = "isValid", default = "default_valid")]
    pub valid: bool,
}

impl AclEntry {
    /// A fresh, valid entry authorizing `secret`.
    pub fn new(subject_id: SubjectId, secret: &VerifierSecret, disclosure_mask: DisclosureMask, expiration: Timestamp) -> Self {
        Self {
            subject_id,
            authorized_secret_hash: secret.digest(),
            disclosure_mask,
            expiration,
            valid: true,
        }
    }

    /// Valid and not past its expiration at `now`.
    pub fn is_usable_at(&self, now: Timestamp) -> bool {
        self.valid && !self.expiration.is_passed_at(now)
    }

    /// The validity and expiration gate.
    pub fn check_freshness(&self, now: Timestamp) -> Result<(), EntitlementError> {
        if self.is_usable_at(now) {
            Ok(())
        } else {
            Err(EntitlementError::Expired {
                subject: self.subject_id.clone(),
                expiration: self.expiration,
            })
        }
    }

    /// Full hash-reveal check of this entry against `secret`.
    pub fn check(&self, secret: &VerifierSecret, now: Timestamp) -> Result<Entitlement, EntitlementError> {
        self.check_freshness(now)?;
        if secret.digest() != self.authorized_secret_hash {
            return Err(EntitlementError::SecretMismatch(self.subject_id.clone()));
        }
        Ok(Entitlement::from(self))
    }
}

/// A granted entitlement: who, what is hidden, until when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub subject_id: SubjectId,
    pub disclosure_mask: DisclosureMask,
    pub authorized_secret_hash: Digest256,
    pub expiration: Timestamp,
}

impl From<&AclEntry> for Entitlement {
    fn from(entry: &AclEntry) -> Self {
        Self {
            subject_id: entry.subject_id.clone(),
            disclosure_mask: entry.disclosure_mask.clone(),
            authorized_secret_hash: entry.authorized_secret_hash,
            expiration: entry.expiration,
        }
    }
}

/// The `{"students": [...]}` document ACL files use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AclDocument {
    pub students: Vec<AclEntry>,
}

/// In-process ACL with per-subject history.
#[derive(Debug, Clone, Default)]
pub struct AccessControlList {
    history: BTreeMap<SubjectId, Vec<AclEntry>>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue each entry in order, so a later entry for a subject supersedes
    /// an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = AclEntry>) -> Self {
        let mut acl = Self::new();
        for entry in entries {
            acl.issue(entry);
        }
        acl
    }

    /// Record `entry` as the subject's current entry, retiring any previous
    /// valid entry.
    pub fn issue(&mut self, entry: AclEntry) {
        let history = self.history.entry(entry.subject_id.clone()).or_default();
        for previous in history.iter_mut() {
            previous.valid = false;
        }
        history.push(entry);
    }

    /// Retire the subject's current entry. Returns false if there is none.
    pub fn retire(&mut self, subject: &SubjectId) -> bool {
        match self.history.get_mut(subject).and_then(|h| h.last_mut()) {
            Some(entry) => {
                entry.valid = false;
                true
            }
            None => false,
        }
    }

    /// The most recently issued entry, retired or not.
    pub fn current(&self, subject: &SubjectId) -> Option<&AclEntry> {
        self.history.get(subject).and_then(|h| h.last())
    }

    /// Every entry ever issued for the subject, oldest first.
    pub fn history(&self, subject: &SubjectId) -> &[AclEntry] {
        self.history.get(subject).map_or(&[], Vec::as_slice)
    }

    /// Current entries, one per subject, in subject order.
    pub fn current_entries(&self) -> impl Iterator<Item = &AclEntry> {
        self.history.values().filter_map(|h| h.last())
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Hash-reveal entitlement check.
    pub fn check_entitlement(
        &self,
        subject: &SubjectId,
        claimed_secret: &VerifierSecret,
        now: Timestamp,
    ) -> Result<Entitlement, EntitlementError> {
        self.current(subject)
            .ok_or_else(|| EntitlementError::NotFound(subject.clone()))?
            .check(claimed_secret, now)
    }

    /// Existence and freshness only, without comparing secrets.
    pub fn check_freshness(&self, subject: &SubjectId, now: Timestamp) -> Result<&AclEntry, EntitlementError> {
        let entry = self
            .current(subject)
            .ok_or_else(|| EntitlementError::NotFound(subject.clone()))?;
        entry.check_freshness(now)?;
        Ok(entry)
    }
}

/// Fixture generator: `n` entries for `did:university:student1..=n`, all
/// authorizing `secret`, the i-th (zero-based) expiring at
/// `base_time + i * 1000`.
pub fn generate_acl_entries(
    n: usize,
    secret: &VerifierSecret,
    base_time: Timestamp,
    mask: &DisclosureMask,
) -> Vec<AclEntry> {
    (0..n)
        .filter_map(|i| {
            let subject = SubjectId::new(format!("did:university:student{}", i + 1)).ok()?;
            let offset = i64::try_from(i).ok()?.saturating_mul(1000);
            Some(AclEntry::new(subject, secret, mask.clone(), base_time.plus_secs(offset)))
        })
        .collect()
}
