//! # Verification Sessions
//!
//! Per-entitlement state that outlives a single round: which secrets have
//! already been proven for which subject, and the cached claimed value
//! `G^x mod P` for each authorized hash.
//!
//! A verified mark is keyed on the presented secret's hash together with
//! the authorized hash it was proven against, so re-issuing an ACL entry
//! invalidates earlier marks.
//!
//! A session is passed explicitly to every round that should share it.
//! Clones share state; separate sessions never interfere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use ets_core::{CryptoError, Digest256, SessionId, SubjectId};
use ets_crypto::GroupParams;
use ets_zkp::ClaimedValue;

#[derive(Default)]
struct SessionState {
    verified: HashSet<(SubjectId, Digest256, Digest256)>,
    claimed: HashMap<Digest256, ClaimedValue>,
}

#[derive(Clone)]
pub struct VerificationSession {
    id: SessionId,
    state: Arc<Mutex<SessionState>>,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_verified(&self, subject: &SubjectId, presented: &Digest256, authorized: &Digest256) -> bool {
        self.state
            .lock()
            .verified
            .contains(&(subject.clone(), *presented, *authorized))
    }

    pub fn mark_verified(&self, subject: &SubjectId, presented: &Digest256, authorized: &Digest256) {
        self.state
            .lock()
            .verified
            .insert((subject.clone(), *presented, *authorized));
    }

    /// Number of verified entitlements.
    pub fn verified_count(&self) -> usize {
        self.state.lock().verified.len()
    }

    /// `G^(hash mod P) mod P`, cached when `cache` is set.
    pub fn claimed_value(
        &self,
        authorized_hash: &Digest256,
        group: &GroupParams,
        cache: bool,
    ) -> Result<ClaimedValue, CryptoError> {
        if !cache {
            return ClaimedValue::from_secret_hash(authorized_hash, group);
        }
        if let Some(v) = self.state.lock().claimed.get(authorized_hash) {
            return Ok(v.clone());
        }
        // Computed outside the lock; a racing insert stores the same value.
        let value = ClaimedValue::from_secret_hash(authorized_hash, group)?;
        self.state.lock().claimed.insert(*authorized_hash, value.clone());
        Ok(value)
    }

    /// Number of cached claimed values.
    pub fn cached_claims(&self) -> usize {
        self.state.lock().claimed.len()
    }
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VerificationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationSession")
            .field("id", &self.id)
            .field("verified", &self.verified_count())
            .finish()
    }
}
