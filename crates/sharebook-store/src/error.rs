//! Error types for the store module.

use sharebook_core::Namespace;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A key read by the transaction changed before it committed.
    #[error("read conflict on {namespace}/{key}: read version {read}, current {current}")]
    Conflict {
        namespace: Namespace,
        key: String,
        read: u64,
        current: u64,
    },

    /// Plaintext access to another organization's private namespace.
    #[error("private namespace {0} is not readable by this transaction")]
    PrivateAccess(Namespace),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Blocking task failed to run to completion.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
