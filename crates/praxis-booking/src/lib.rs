//! # Praxis Booking
//!
//! The slot registry for the Praxis platform: slot lifecycle, per-slot
//! concurrency control, and search over slots and facilities.
//!
//! ## Key Types
//!
//! - [`SlotRegistry`] - Drives the slot state machine under per-slot locks
//! - [`SlotQuery`] / [`FacilityQuery`] - Pure search filters
//! - [`RegistryError`] - Not-found, conflict, and validation errors
//!
//! ## Design Notes
//!
//! - **One winner per slot**: booking races are serialized by per-slot
//!   locks; the loser gets a `NotBookable` conflict
//! - **Record sync lives above**: the registry never touches patient
//!   records; the coordinator propagates slot changes into them

pub mod error;
pub mod registry;
pub mod search;

pub use error::{RegistryError, Result};
pub use registry::SlotRegistry;
pub use search::{FacilityQuery, SlotQuery};
