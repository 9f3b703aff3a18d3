//! # ets-ledger: Ledger Collaborator
//!
//! The ledger is an opaque, totally ordered state machine. The core asks it
//! for challenges, stores ACL entries and Merkle roots in it, and submits
//! proofs to it; it is otherwise passive.
//!
//! - **Contract** (`traits.rs`): the async [`Ledger`] trait and its
//!   request/receipt records. Shared as `Arc<dyn Ledger>`.
//! - **In-memory** (`memory.rs`): [`InMemoryLedger`], a complete ledger for
//!   tests and the CLI, including availability switches to simulate
//!   transport failure.
//! - **Retry** (`retry.rs`): [`RetryingLedger`], exponential backoff around
//!   any ledger, retrying only `LedgerError::Unavailable`.

pub mod error;
pub mod memory;
pub mod retry;
pub mod traits;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use retry::{RetryPolicy, RetryingLedger};
pub use traits::{BatchReceipt, CommitResult, Ledger, ProofReceipt, ProofSubmission};
