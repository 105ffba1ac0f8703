//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Document serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored document failed to decode.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// A blocking task or lock failed.
    #[error("task error: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
