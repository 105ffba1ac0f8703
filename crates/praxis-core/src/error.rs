//! Error types for the Praxis core.

use thiserror::Error;

use crate::slot::SlotStatus;
use crate::types::SlotId;

/// Core errors for encoding and audit chain verification.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The audit chain does not verify at the given event index.
    #[error("audit chain broken at event {index}")]
    ChainBroken { index: usize },

    /// Encoding error.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Decoding error.
    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Errors from the slot state machine.
///
/// Only booking is state-restricted; release and cancel are legal from any
/// state (see [`crate::slot::Slot`]).
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The slot is not currently open for booking.
    #[error("slot {slot} is not bookable: status is {status:?}")]
    NotBookable { slot: SlotId, status: SlotStatus },
}
