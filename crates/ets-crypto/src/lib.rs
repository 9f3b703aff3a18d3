//! # ets-crypto: Cryptographic Primitives
//!
//! Provides the arithmetic and integrity building blocks for the stack:
//!
//! - **Modular arithmetic** over a public `(G, P)` pair, with a fixed
//!   square-and-multiply ladder for exponentiation.
//! - **Group parameters** and the hash-to-exponent mapping used by the
//!   Schnorr prover and verifier.
//! - **Merkle engine** binding an ordered set of credential digests to a
//!   single root, with positional inclusion proofs.
//!
//! ## Crate Policy
//!
//! - Depends only on `ets-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   SHA-256 and real big-integer arithmetic.

pub mod group;
pub mod merkle;
pub mod modular;

pub use group::{GroupParams, DEFAULT_GENERATOR, DEFAULT_MODULUS};
pub use merkle::{hash_pair, verify_inclusion, MerkleProof, MerkleTree};
pub use modular::modpow;
