//! Application error types for core storage and domain logic.
use thiserror::Error;

/// Reasons a payload is rejected before it reaches storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Zero-length or all-null payload.
    #[error("Empty file")]
    Empty,

    #[error("File size {actual} exceeds maximum of {limit} bytes")]
    TooLarge { actual: usize, limit: usize },
}

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid payload: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Content-addressed pastes cannot be updated")]
    Immutable,

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),
}

impl AppError {
    /// Whether the failure was caused by the server rather than the request.
    ///
    /// Server faults are logged in full and reported to clients generically.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Io(_) | Self::StorageMessage(_)
        )
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, ValidationError};

    #[test]
    fn server_faults_are_limited_to_storage_failures() {
        assert!(AppError::StorageMessage("disk".to_string()).is_server_fault());
        assert!(AppError::Io(std::io::Error::other("boom")).is_server_fault());
        assert!(!AppError::NotFound.is_server_fault());
        assert!(!AppError::RateLimited.is_server_fault());
        assert!(!AppError::from(ValidationError::Empty).is_server_fault());
    }
}
