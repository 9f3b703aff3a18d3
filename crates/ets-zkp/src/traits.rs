//! # Proof System Trait
//!
//! The verification contract shared by the batch verifier and the ledger's
//! re-verification on submission. Implementations must be `Send + Sync` so a
//! single verifier can serve concurrent rounds.
//!
//! Verification is a pure function of the proof, the public statement, and
//! the challenge the ledger issued. It never consults ambient state.

use num_bigint::BigUint;
use thiserror::Error;

use ets_core::CryptoError;

/// Error during proof generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// `P <= 2` leaves no nonce range and no meaningful response.
    #[error("degenerate group: {0}")]
    DegenerateGroup(String),
    /// A nonce or witness lies outside its valid range.
    #[error("witness error: {0}")]
    WitnessError(String),
    /// Arithmetic failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Error during proof verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A proof component is out of range or the proof names another group.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The proof's challenge is not the one issued for its commitment.
    #[error("challenge mismatch: issued {issued}, proof carries {presented}")]
    ChallengeMismatch {
        /// Challenge the ledger issued for `R`.
        issued: BigUint,
        /// Challenge carried in the proof.
        presented: BigUint,
    },
    /// Well-formed proof, verification equation does not hold.
    #[error("proof rejected: verification equation does not hold")]
    Rejected,
}

/// Abstract verification interface.
pub trait ProofSystem: Send + Sync {
    /// The proof record.
    type Proof: Send + Sync;
    /// The public statement proven against.
    type Statement: Send + Sync;
    /// The ledger-issued binding value.
    type Challenge: Send + Sync;

    /// Accept or reject `proof` for `statement` under `issued`.
    fn verify(
        &self,
        statement: &Self::Statement,
        proof: &Self::Proof,
        issued: &Self::Challenge,
    ) -> Result<(), VerifyError>;

    /// Boolean form of [`verify`](Self::verify).
    fn is_valid(&self, statement: &Self::Statement, proof: &Self::Proof, issued: &Self::Challenge) -> bool {
        self.verify(statement, proof, issued).is_ok()
    }
}
