//! Error types for the vault module.

use praxis_core::SubjectId;
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A stored record exists but cannot be recovered: missing key, failed
    /// authentication, or a malformed envelope. Never silently treated as
    /// an absent record.
    #[error("record integrity failure for {subject}: {detail}")]
    Integrity { subject: SubjectId, detail: String },

    /// Encryption-side failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Record or envelope serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] praxis_store::StoreError),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
