//! Retry with exponential backoff for ledger transport.
//!
//! Retries only `LedgerError::Unavailable`. Rejections and missing records
//! are returned at once. The verification core never retries on its own;
//! wrapping a ledger in [`RetryingLedger`] is how a deployment opts in.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ets_access::{AclEntry, TranscriptRegistration};
use ets_core::{Digest256, SubjectId};
use ets_crypto::MerkleProof;
use ets_zkp::{Challenge, Commitment};

use crate::error::LedgerError;
use crate::traits::{BatchReceipt, CommitResult, Ledger, ProofReceipt, ProofSubmission};

/// Backoff settings. Delays double each attempt: 200ms, 400ms, 800ms by
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// A ledger whose calls are retried on `Unavailable`.
#[derive(Clone)]
pub struct RetryingLedger {
    inner: Arc<dyn Ledger>,
    policy: RetryPolicy,
}

impl RetryingLedger {
    pub fn new(inner: Arc<dyn Ledger>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn retry<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T, LedgerError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, LedgerError>> + Send,
        T: Send,
    {
        for attempt in 0..self.policy.max_retries {
            match f().await {
                Err(e) if e.is_retryable() => {
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        "ledger call failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
        // Final attempt, no more retries.
        f().await
    }
}

impl std::fmt::Debug for RetryingLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingLedger")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Ledger for RetryingLedger {
    async fn get_challenge(&self, commitment: &Commitment) -> Result<Challenge, LedgerError> {
        self.retry("get_challenge", || self.inner.get_challenge(commitment)).await
    }

    async fn issued_challenge(&self, commitment: &Commitment) -> Result<Option<Challenge>, LedgerError> {
        self.retry("issued_challenge", || self.inner.issued_challenge(commitment)).await
    }

    async fn store_acl(&self, entry: AclEntry) -> Result<CommitResult, LedgerError> {
        self.retry("store_acl", || self.inner.store_acl(entry.clone())).await
    }

    async fn get_acl(&self, subject: &SubjectId) -> Result<AclEntry, LedgerError> {
        self.retry("get_acl", || self.inner.get_acl(subject)).await
    }

    async fn store_merkle_root(&self, root: Digest256) -> Result<CommitResult, LedgerError> {
        self.retry("store_merkle_root", || self.inner.store_merkle_root(root)).await
    }

    async fn merkle_root(&self) -> Result<Option<Digest256>, LedgerError> {
        self.retry("merkle_root", || self.inner.merkle_root()).await
    }

    async fn verify_merkle_proof(&self, proof: &MerkleProof, leaf: &Digest256) -> Result<bool, LedgerError> {
        self.retry("verify_merkle_proof", || self.inner.verify_merkle_proof(proof, leaf)).await
    }

    async fn submit_proof(&self, submission: ProofSubmission) -> Result<ProofReceipt, LedgerError> {
        self.retry("submit_proof", || self.inner.submit_proof(submission.clone())).await
    }

    async fn submit_batch(&self, submissions: Vec<ProofSubmission>) -> Result<BatchReceipt, LedgerError> {
        self.retry("submit_batch", || self.inner.submit_batch(submissions.clone())).await
    }

    async fn is_verified(&self, subject: &SubjectId) -> Result<bool, LedgerError> {
        self.retry("is_verified", || self.inner.is_verified(subject)).await
    }

    async fn store_subject_index(&self, subject: &SubjectId, index: usize) -> Result<CommitResult, LedgerError> {
        self.retry("store_subject_index", || self.inner.store_subject_index(subject, index)).await
    }

    async fn get_subject_index(&self, subject: &SubjectId) -> Result<usize, LedgerError> {
        self.retry("get_subject_index", || self.inner.get_subject_index(subject)).await
    }

    async fn register_transcript(&self, registration: TranscriptRegistration) -> Result<CommitResult, LedgerError> {
        self.retry("register_transcript", || self.inner.register_transcript(registration.clone())).await
    }

    async fn transcript(&self, subject: &SubjectId) -> Result<Option<TranscriptRegistration>, LedgerError> {
        self.retry("transcript", || self.inner.transcript(subject)).await
    }

    async fn verify_transcript(
        &self,
        subject: &SubjectId,
        acl_hash: &Digest256,
        vc_hash: &Digest256,
    ) -> Result<bool, LedgerError> {
        self.retry("verify_transcript", || self.inner.verify_transcript(subject, acl_hash, vc_hash))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;
    use ets_crypto::GroupParams;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let inner = Arc::new(InMemoryLedger::new(GroupParams::default()));
        inner.fail_next(3);
        let ledger = RetryingLedger::new(inner.clone(), fast());
        assert_eq!(ledger.merkle_root().await, Ok(None));
    }

    #[tokio::test]
    async fn exhausts_all_attempts_then_surfaces_unavailable() {
        let inner = Arc::new(InMemoryLedger::new(GroupParams::default()));
        inner.fail_next(4);
        let ledger = RetryingLedger::new(inner.clone(), fast());
        assert!(matches!(ledger.merkle_root().await, Err(LedgerError::Unavailable(_))));
        // All four failures were consumed by the four attempts.
        assert_eq!(inner.merkle_root().await, Ok(None));
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let inner = Arc::new(InMemoryLedger::new(GroupParams::default()));
        let ledger = RetryingLedger::new(inner.clone(), fast());
        let subject = SubjectId::new("did:university:student1").unwrap();
        inner.fail_next(0);
        assert!(matches!(ledger.get_acl(&subject).await, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn delays_double() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(0), Duration::from_millis(200));
        assert_eq!(p.delay(1), Duration::from_millis(400));
        assert_eq!(p.delay(2), Duration::from_millis(800));
    }
}
