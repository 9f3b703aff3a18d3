//! # ets-core: Foundational Types for the E-Transcript Stack
//!
//! Every other crate in the workspace depends on `ets-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for protocol values.** `SubjectId`, `Digest256`,
//!    `VerifierSecret`, `Timestamp`: validated constructors, no bare strings
//!    or integers crossing crate boundaries.
//!
//! 2. **Digests over exact text.** Secrets, subject identifiers and rendered
//!    disclosure lists are hashed as UTF-8 text via [`digest::sha256_str`],
//!    so every hash can be reproduced byte for byte by the registrar.
//!
//! 3. **Secrets never print.** `VerifierSecret` has a redacting `Debug` and
//!    is zeroized on drop.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ets-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod secret;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{sha256_bytes, sha256_str, Digest256};
pub use error::{CryptoError, EtsError};
pub use identity::{SessionId, SubjectId};
pub use secret::VerifierSecret;
pub use temporal::{Clock, Timestamp};
