//! # Credential Store
//!
//! Off-ledger storage of credential records, keyed by subject. Each record
//! is kept with the credential hash recorded when it was stored; a
//! presentation is consistent only if it carries that same hash.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ets_core::{Digest256, SubjectId};

use crate::disclosure::CredentialRecord;

/// A stored record and its credential hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub record: CredentialRecord,
    #[serde(alias = "hashed_vc")]
    pub vc_hash: Digest256,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    by_subject: BTreeMap<SubjectId, StoredCredential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under the subject's own credential hash.
    pub fn insert(&mut self, subject: SubjectId, record: CredentialRecord) {
        let vc_hash = subject.vc_hash();
        self.insert_with_hash(subject, record, vc_hash);
    }

    /// Store `record` with an explicit credential hash.
    pub fn insert_with_hash(&mut self, subject: SubjectId, record: CredentialRecord, vc_hash: Digest256) {
        self.by_subject.insert(subject, StoredCredential { record, vc_hash });
    }

    pub fn get(&self, subject: &SubjectId) -> Option<&StoredCredential> {
        self.by_subject.get(subject)
    }

    pub fn vc_hash(&self, subject: &SubjectId) -> Option<Digest256> {
        self.by_subject.get(subject).map(|c| c.vc_hash)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &SubjectId> {
        self.by_subject.keys()
    }

    pub fn len(&self) -> usize {
        self.by_subject.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_subject.is_empty()
    }
}
