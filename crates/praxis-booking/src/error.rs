//! Error types for the booking module.

use praxis_core::{FacilityId, SlotId, SlotStatus, TransitionError};
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Slot not found.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// A slot with this id already exists.
    #[error("slot already exists: {0}")]
    SlotExists(SlotId),

    /// The slot is not open for booking.
    #[error("slot {slot} is not bookable: status is {status:?}")]
    NotBookable { slot: SlotId, status: SlotStatus },

    /// The slot references an unknown facility.
    #[error("facility not found: {0}")]
    FacilityNotFound(FacilityId),

    /// The slot definition is not valid.
    #[error("invalid slot: {0}")]
    InvalidSlot(String),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] praxis_store::StoreError),
}

impl From<TransitionError> for RegistryError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotBookable { slot, status } => {
                RegistryError::NotBookable { slot, status }
            }
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
