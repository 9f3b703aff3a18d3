//! Errors from ledger operations.

use thiserror::Error;

/// Errors from ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transport or consensus failure. The only retry-eligible error.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger refused the operation.
    #[error("ledger rejected operation: {0}")]
    Rejected(String),

    /// The requested record does not exist.
    #[error("not found on ledger: {0}")]
    NotFound(String),
}

impl LedgerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}
