use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures raised at the store boundary.
///
/// Apart from [`StorageError::Conflict`], every variant is fatal to the
/// current allocation call and is surfaced to the caller as a server-side
/// failure.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("path already exists: {0}")]
    Conflict(String),
    #[error("sequence row has not been initialized")]
    Uninitialized,
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// Errors reported to callers of the allocation protocol.
#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    #[error("custom path \"{0}\" already exists")]
    AlreadyExists(String),
    #[error("path \"{0}\" not allowed")]
    NotAllowed(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("code sequence exhausted at counter {counter}")]
    Exhausted { counter: u64 },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AllocationError {
    /// Whether the error was caused by the caller's input rather than by the
    /// service or its stores.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists(_)
                | Self::NotAllowed(_)
                | Self::InvalidPath(_)
                | Self::InvalidPayload(_)
        )
    }
}
