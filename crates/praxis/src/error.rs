//! Error types for the platform API.

use praxis_booking::RegistryError;
use praxis_store::StoreError;
use praxis_vault::VaultError;
use thiserror::Error;

/// Errors surfaced by platform operations.
///
/// This is the outward-facing taxonomy: lower-layer errors are folded into
/// these kinds so callers can map them to responses without knowing the
/// layering.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The addressed entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation lost a race or hit an already-taken identifier.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor is not allowed to perform this operation.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The request is malformed.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Stored data exists but cannot be trusted or recovered.
    #[error("integrity failure: {0}")]
    Integrity(String),

    /// The storage backend failed.
    #[error("storage unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for PlatformError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(detail) => PlatformError::Integrity(detail),
            other => PlatformError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<VaultError> for PlatformError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Integrity { .. } => PlatformError::Integrity(err.to_string()),
            VaultError::Crypto(detail) => PlatformError::Integrity(detail),
            VaultError::Serialization(detail) => PlatformError::Integrity(detail),
            VaultError::Store(store) => store.into(),
        }
    }
}

impl From<RegistryError> for PlatformError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::SlotNotFound(_) | RegistryError::FacilityNotFound(_) => {
                PlatformError::NotFound(err.to_string())
            }
            RegistryError::SlotExists(_) | RegistryError::NotBookable { .. } => {
                PlatformError::Conflict(err.to_string())
            }
            RegistryError::InvalidSlot(detail) => PlatformError::Invalid(detail),
            RegistryError::Store(store) => store.into(),
        }
    }
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
