//! # Ledger Contract
//!
//! Every operation is async and must be awaited before dependent steps
//! proceed: the challenge before the response, the root commitment before
//! any proof is checked against it.
//!
//! Implementations must only return `Ok` for a write once it is durably
//! recorded. State is replaced whole (an ACL entry, a root, a registration);
//! there are no partial updates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ets_access::{AclEntry, TranscriptRegistration};
use ets_core::{Digest256, SubjectId};
use ets_crypto::MerkleProof;
use ets_zkp::{Challenge, Commitment, SchnorrProof};

use crate::error::LedgerError;

/// Confirmation of a committed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    /// Block that includes the write.
    pub block: u64,
    /// Transaction reference, hex.
    pub transaction_id: String,
}

/// A proof tuple submitted for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSubmission {
    pub subject_id: SubjectId,
    pub proof: SchnorrProof,
    /// Hash the proof is claimed against; the claimed value is
    /// `G^(hash mod P) mod P`.
    pub authorized_secret_hash: Digest256,
}

/// Outcome of one submitted proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofReceipt {
    pub success: bool,
    pub cost: u64,
    pub block: u64,
}

/// Outcome of an all-or-nothing batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// True iff every proof verified and the batch was recorded.
    pub committed: bool,
    /// Per-proof verification outcome, in submission order.
    pub results: Vec<bool>,
    pub cost: u64,
    pub block: u64,
}

/// The ledger collaborator.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Challenge bound to `commitment`. Deterministic for a given `R` and
    /// ledger state; asking twice returns the same value. Each call opens one
    /// round for `R`, and each accepted submission closes one.
    async fn get_challenge(&self, commitment: &Commitment) -> Result<Challenge, LedgerError>;

    /// The challenge already issued for `commitment`, if any. A view: opens
    /// no round.
    async fn issued_challenge(&self, commitment: &Commitment) -> Result<Option<Challenge>, LedgerError>;

    /// Store `entry` as the subject's current ACL entry, superseding any
    /// previous one.
    async fn store_acl(&self, entry: AclEntry) -> Result<CommitResult, LedgerError>;

    /// The subject's current ACL entry, retired or not.
    async fn get_acl(&self, subject: &SubjectId) -> Result<AclEntry, LedgerError>;

    async fn store_merkle_root(&self, root: Digest256) -> Result<CommitResult, LedgerError>;

    /// The most recently anchored root, if any.
    async fn merkle_root(&self) -> Result<Option<Digest256>, LedgerError>;

    /// Check `leaf` at `proof.leaf_index` against the anchored root.
    /// False when no root is anchored.
    async fn verify_merkle_proof(&self, proof: &MerkleProof, leaf: &Digest256) -> Result<bool, LedgerError>;

    /// Verify and record one proof. Fails without an open round for its
    /// commitment.
    async fn submit_proof(&self, submission: ProofSubmission) -> Result<ProofReceipt, LedgerError>;

    /// Verify every proof; record all of them only if all verify.
    async fn submit_batch(&self, submissions: Vec<ProofSubmission>) -> Result<BatchReceipt, LedgerError>;

    /// Whether a proof for the subject has been accepted.
    async fn is_verified(&self, subject: &SubjectId) -> Result<bool, LedgerError>;

    async fn store_subject_index(&self, subject: &SubjectId, index: usize) -> Result<CommitResult, LedgerError>;

    async fn get_subject_index(&self, subject: &SubjectId) -> Result<usize, LedgerError>;

    async fn register_transcript(&self, registration: TranscriptRegistration) -> Result<CommitResult, LedgerError>;

    async fn transcript(&self, subject: &SubjectId) -> Result<Option<TranscriptRegistration>, LedgerError>;

    /// True iff a registration exists for the subject with both hashes
    /// matching and not yet expired.
    async fn verify_transcript(
        &self,
        subject: &SubjectId,
        acl_hash: &Digest256,
        vc_hash: &Digest256,
    ) -> Result<bool, LedgerError>;
}
