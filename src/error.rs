//! Error types for the Causeway coordinator

use crate::store::StoreError;
use thiserror::Error;

/// Main error type for coordinator operations
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Transaction {id} not found")]
    TransactionNotFound { id: String },

    #[error("Interchain request {id} not found")]
    RequestNotFound { id: u64 },

    #[error("Transaction {id} already exists")]
    AlreadyExists { id: String },

    #[error("{path} is locked by unfinished transaction {holder}")]
    ResourceLocked { path: String, holder: String },

    #[error("{path} is unregistered in transaction {id}")]
    Unregistered { path: String, id: String },

    #[error("Sequence number {seq} must be greater than last recorded {last}")]
    SequenceViolation { seq: u64, last: u64 },

    #[error("Transaction {id} has been committed")]
    AlreadyCommitted { id: String },

    #[error("Transaction {id} has been rolled back")]
    AlreadyRolledBack { id: String },

    #[error("Invalid resource path: {0}")]
    InvalidPath(String),

    #[error("Task queue head does not match {expected}")]
    TaskMismatch { expected: String },

    #[error("Resource invocation failed: {0}")]
    Invocation(String),

    #[error("Identity resolution failed: {0}")]
    Identity(String),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CoordinatorError {
    /// Check if the error is a caller-race conflict the relay may retry
    /// after re-reading coordinator state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoordinatorError::AlreadyExists { .. }
                | CoordinatorError::ResourceLocked { .. }
                | CoordinatorError::SequenceViolation { .. }
                | CoordinatorError::TaskMismatch { .. }
        )
    }

    /// Check if the error marks a transaction already in a terminal state
    pub fn is_terminal_state(&self) -> bool {
        matches!(
            self,
            CoordinatorError::AlreadyCommitted { .. }
                | CoordinatorError::AlreadyRolledBack { .. }
        )
    }
}

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
