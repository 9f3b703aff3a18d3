//! # Verification Errors
//!
//! Every failure a caller can see, classified by [`FailureKind`] so that a
//! security reject is never mistaken for an availability problem. Neither
//! kind is retried by the service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ets_access::EntitlementError;
use ets_core::{CryptoError, SubjectId};
use ets_ledger::LedgerError;
use ets_zkp::{ProofError, VerifyError};

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The presented proof, secret, or credential was refused.
    SecurityReject,
    /// The ledger could not be reached. Eligible for caller-directed retry.
    Availability,
    /// The request itself was unusable (bad index, empty tree, bad config),
    /// or an item never reached the ledger (cancelled, or held back with a
    /// refused all-or-nothing batch).
    Caller,
    /// The ledger refused an operation it should have accepted, or a task
    /// failed.
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// `R`, `s` or `c` out of range, or a proof for another group.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The proof's challenge is not the one issued for its commitment.
    #[error("challenge mismatch: {0}")]
    ChallengeMismatch(String),

    #[error("secret does not match the authorized verifier for {0}")]
    SecretMismatch(SubjectId),

    #[error("entitlement for {0} is expired or retired")]
    EntitlementExpired(SubjectId),

    #[error("no entitlement for {0}")]
    EntitlementNotFound(SubjectId),

    #[error("merkle tree has no leaves")]
    TreeEmpty,

    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    ProofPositionInvalid { index: usize, leaf_count: usize },

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// Well-formed proof that does not verify.
    #[error("proof rejected for {0}")]
    Rejected(SubjectId),

    /// The credential presented or stored does not match the anchored one.
    #[error("credential integrity check failed for {0}")]
    IntegrityMismatch(SubjectId),

    /// Passed on its own but was not recorded because its all-or-nothing
    /// batch was refused.
    #[error("not committed: batch for {0} was refused")]
    NotCommitted(SubjectId),

    /// Cancelled before the round was submitted.
    #[error("verification cancelled before submission")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VerificationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedProof(_)
            | Self::ChallengeMismatch(_)
            | Self::SecretMismatch(_)
            | Self::EntitlementExpired(_)
            | Self::EntitlementNotFound(_)
            | Self::Rejected(_)
            | Self::IntegrityMismatch(_) => FailureKind::SecurityReject,
            Self::LedgerUnavailable(_) => FailureKind::Availability,
            Self::TreeEmpty
            | Self::ProofPositionInvalid { .. }
            | Self::NotCommitted(_)
            | Self::Cancelled
            | Self::Config(_) => FailureKind::Caller,
            Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Attach a subject to a verifier-side error.
    pub(crate) fn from_verify(err: VerifyError, subject: &SubjectId) -> Self {
        match err {
            VerifyError::MalformedProof(msg) => Self::MalformedProof(msg),
            e @ VerifyError::ChallengeMismatch { .. } => Self::ChallengeMismatch(e.to_string()),
            VerifyError::Rejected => Self::Rejected(subject.clone()),
        }
    }
}

impl From<EntitlementError> for VerificationError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::NotFound(s) => Self::EntitlementNotFound(s),
            EntitlementError::Expired { subject, .. } => Self::EntitlementExpired(subject),
            EntitlementError::SecretMismatch(s) => Self::SecretMismatch(s),
        }
    }
}

impl From<LedgerError> for VerificationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable(msg) => Self::LedgerUnavailable(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CryptoError> for VerificationError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::TreeEmpty => Self::TreeEmpty,
            CryptoError::ProofPositionInvalid { index, leaf_count } => {
                Self::ProofPositionInvalid { index, leaf_count }
            }
            CryptoError::InvalidModulus(_) | CryptoError::InvalidGroup(_) => Self::Config(err.to_string()),
            CryptoError::DigestError(msg) => Self::Internal(msg),
        }
    }
}

impl From<ProofError> for VerificationError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::DegenerateGroup(msg) => Self::Config(msg),
            ProofError::Crypto(e) => e.into(),
            ProofError::WitnessError(msg) => Self::Internal(msg),
        }
    }
}
