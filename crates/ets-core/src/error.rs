//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared across the stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Cryptographic errors fail loudly with full context.
//! - Identifier and timestamp validation errors name the offending input.
//! - Merkle errors distinguish an empty leaf set from an out-of-range
//!   position, since callers report them differently.

use thiserror::Error;

/// Top-level error type for the stack.
#[derive(Error, Debug)]
pub enum EtsError {
    /// Cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// An identifier, timestamp, or other boundary value is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Modulus is zero or one; no residue ring exists.
    #[error("invalid modulus: must be greater than 1, got {0}")]
    InvalidModulus(String),

    /// Group parameters are unusable (generator out of range, modulus too small).
    #[error("invalid group parameters: {0}")]
    InvalidGroup(String),

    /// Hex or digest decoding failed.
    #[error("digest error: {0}")]
    DigestError(String),

    /// Merkle tree construction was attempted over zero leaves.
    #[error("merkle tree has no leaves")]
    TreeEmpty,

    /// A Merkle leaf position lies outside the committed leaf range.
    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    ProofPositionInvalid {
        /// The requested leaf index.
        index: usize,
        /// Number of leaves in the tree.
        leaf_count: usize,
    },
}
