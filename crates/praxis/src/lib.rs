//! Praxis: a consent-gated clinical booking platform core.
//!
//! The platform joins two halves. The record side keeps one encrypted
//! [`PatientRecord`] per subject behind a consent gate, with a hash-chained
//! audit log and a plaintext access ledger the patient can read. The booking
//! side runs facility slot inventories through a small open/booked/cancelled
//! state machine. [`BookingCoordinator`] is the single entry point that holds
//! the two halves consistent.
//!
//! Layering, bottom up:
//!
//! - `praxis-core`: domain types, transitions, and the audit chain.
//! - `praxis-store`: the async [`Store`] trait with in-memory and SQLite
//!   backends.
//! - `praxis-vault`: per-subject encryption keys, sealed envelopes, and the
//!   consent gate.
//! - `praxis-booking`: the slot registry and search queries.
//! - this crate: audit log, access ledger, notifications, and the
//!   coordinator tying them together.

pub mod access;
pub mod audit;
pub mod coordinator;
pub mod error;
pub mod notify;

pub use access::AccessLedger;
pub use audit::AuditLog;
pub use coordinator::{BookingCoordinator, BookingConfirmation};
pub use error::{PlatformError, Result};
pub use notify::{MemoryNotifier, NoopNotifier, Notification, Notifier};

pub use praxis_booking::{FacilityQuery, SlotQuery, SlotRegistry};
pub use praxis_core::{
    verify_chain, AccessRecord, ActorId, AuditAction, AuditEvent, Facility, FacilityId, Identity,
    Occupant, PatientProfile, PatientRecord, Role, Slot, SlotId, SlotPatch, SlotStatus, Specialty,
    SubjectId, TreatmentNote,
};
pub use praxis_store::{MemoryStore, SqliteStore, Store};
pub use praxis_vault::{ConsentGate, RecordVault};
