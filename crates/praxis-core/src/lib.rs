//! # Praxis Core
//!
//! Pure domain primitives for the Praxis platform: patient records, bookable
//! slots, consent sets, and the hash-chained audit trail.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over domain data structures; persistence and orchestration
//! live in the companion crates.
//!
//! ## Key Types
//!
//! - [`PatientRecord`] - The per-subject record stored encrypted at rest
//! - [`Slot`] - A bookable appointment unit with a three-state lifecycle
//! - [`AuditEvent`] - One entry of the tamper-evident audit trail
//! - [`Identity`] - A pre-authenticated actor with a closed [`Role`] set
//!
//! ## Audit chaining
//!
//! Every audit event carries a chain hash derived from its own content hash
//! and the previous event's chain hash. See [`audit`] and [`canonical`].

pub mod audit;
pub mod canonical;
pub mod error;
pub mod facility;
pub mod hash;
pub mod identity;
pub mod record;
pub mod slot;
pub mod types;

pub use audit::{verify_chain, AccessRecord, AuditAction, AuditEvent};
pub use canonical::audit_content_bytes;
pub use error::{CoreError, TransitionError};
pub use facility::{Department, Facility, Provider, Specialty};
pub use hash::ChainHash;
pub use identity::{Identity, Role};
pub use record::{Appointment, PatientProfile, PatientRecord, TreatmentNote};
pub use slot::{Occupant, Slot, SlotPatch, SlotStatus};
pub use types::{ActorId, DepartmentId, EventId, FacilityId, ProviderId, SlotId, SubjectId};
