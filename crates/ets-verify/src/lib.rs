//! # ets-verify: Verification Service
//!
//! The caller-facing core: runs Schnorr rounds against the ledger, anchors
//! credential roots, and returns masked records to verified parties.
//!
//! ## Data flow
//!
//! ```text
//! ProofRequest ─▶ ACL gate ─▶ commit R ─▶ ledger challenge ─▶ respond s
//!              ─▶ verify (binding + equation) ─▶ submit ─▶ integrity check
//!              ─▶ VerifiedClaim ─▶ disclose ─▶ masked CredentialRecord
//! ```
//!
//! In hash-reveal mode the ACL gate compares the secret hash directly and
//! no Schnorr round runs. The two modes are different security properties
//! and are never mixed within one service.
//!
//! ## Concurrency
//!
//! Batch items run as independent tasks. The only state they share is the
//! [`VerificationSession`] (per-entitlement verified flags and cached
//! claimed values) and the ledger itself. Cancellation stops rounds that
//! have not yet been submitted; a submitted round always completes.

pub mod config;
pub mod error;
pub mod mode;
pub mod outcome;
pub mod request;
pub mod service;
pub mod session;

pub use config::VerifierConfig;
pub use error::{FailureKind, VerificationError};
pub use mode::{BatchPolicy, VerificationMode};
pub use outcome::{BatchMetrics, BatchReport, BatchStatus, ItemMetrics, VerificationOutcome, VerifiedClaim};
pub use request::{BatchPayload, ProofRequest};
pub use service::VerificationService;
pub use session::VerificationSession;
