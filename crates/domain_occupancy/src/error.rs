//! Occupancy domain errors

use core_kernel::StoreError;
use thiserror::Error;

/// Errors that can occur in the occupancy domain
#[derive(Debug, Error)]
pub enum OccupancyError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Allocation rule violation: full room, unavailable room, resident
    /// already housed, or a lost optimistic version race
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store or connectivity failure
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl OccupancyError {
    pub fn validation(message: impl Into<String>) -> Self {
        OccupancyError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        OccupancyError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        OccupancyError::Conflict(message.into())
    }
}

/// Referential and uniqueness failures keep their meaning; version conflicts
/// stay wrapped so retry loops can see them before giving up.
impl From<StoreError> for OccupancyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => OccupancyError::NotFound(err.to_string()),
            StoreError::Conflict { .. } => OccupancyError::Conflict(err.to_string()),
            StoreError::Validation { .. } => OccupancyError::Validation(err.to_string()),
            other => OccupancyError::Store(other),
        }
    }
}
