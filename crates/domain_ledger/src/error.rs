//! Ledger domain errors

use core_kernel::{MoneyError, StoreError, TemporalError};
use thiserror::Error;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// State-machine violation: duplicate billing period, duplicate invoice,
    /// over-payment, cancelled billing, or a write that lost an optimistic
    /// version race after bounded retries
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store or connectivity failure; surfaced, never swallowed
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict(message.into())
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

impl From<TemporalError> for LedgerError {
    fn from(err: TemporalError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Referential and uniqueness failures from the store keep their meaning;
/// version conflicts stay wrapped so retry loops can see them before giving
/// up; everything else is an infrastructure failure.
impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => LedgerError::NotFound(err.to_string()),
            StoreError::Conflict { .. } => LedgerError::Conflict(err.to_string()),
            StoreError::Validation { .. } => LedgerError::Validation(err.to_string()),
            other => LedgerError::Store(other),
        }
    }
}
