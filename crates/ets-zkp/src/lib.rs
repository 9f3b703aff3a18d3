//! # ets-zkp: Schnorr Proof of Knowledge
//!
//! Proves knowledge of `x = H(secret) mod P` relative to the public value
//! `G^x mod P`, with the challenge supplied by the ledger.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): `ProofSystem`, the verification contract the
//!   batch verifier and ledger are written against, plus the prover and
//!   verifier error types.
//!
//! - **Proof** (`proof.rs`): `Commitment`, `Challenge`, `Response`, and the
//!   complete `SchnorrProof` tuple, range-checked at construction.
//!
//! - **Prover** (`prover.rs`): `commit` then `respond`. The nonce is a
//!   move-only value consumed by `respond`, so it cannot be reused.
//!
//! - **Verifier** (`verifier.rs`): checks `G^s == R * C^c (mod P)` after the
//!   challenge binding check.
//!
//! - **Batch** (`batch.rs`): independent per-item verification with
//!   aggregate counters and no shared state between items.
//!
//! ## Known Weaknesses, Preserved
//!
//! - Nonce reuse across two challenges recovers `x`.
//! - `x` lives in `[0, P)`, so a small modulus collapses the secret space.
//!
//! ## Crate Policy
//!
//! - Depends on `ets-core` and `ets-crypto` internally.
//! - No `unsafe`.

pub mod batch;
pub mod proof;
pub mod prover;
pub mod traits;
pub mod verifier;

pub use batch::{BatchItem, BatchResult, BatchVerifier};
pub use proof::{Challenge, Commitment, Response, SchnorrProof};
pub use prover::{Nonce, SchnorrProver, Witness};
pub use traits::{ProofError, ProofSystem, VerifyError};
pub use verifier::{ClaimedValue, SchnorrVerifier};
