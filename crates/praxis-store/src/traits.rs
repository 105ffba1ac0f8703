//! Store trait: the abstract interface for platform persistence.
//!
//! This trait keeps the vault, registry, and coordinator storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use praxis_core::{AccessRecord, AuditEvent, Facility, FacilityId, Slot, SlotId, SubjectId};

use crate::error::Result;

/// The Store trait: async interface for platform persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, `spawn_blocking` is used internally to avoid blocking the
/// runtime.
///
/// # Design Notes
///
/// - **Opaque record blobs**: the store never sees record plaintext; it
///   persists sealed envelopes keyed by subject.
/// - **Append-only logs**: audit events and access records are only ever
///   appended, in insertion order.
/// - **No transitions here**: slot state changes are decided above the
///   store, under per-slot locks; `upsert_slot` just persists the result.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Record Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the record key for a subject, if one has been created.
    async fn get_record_key(&self, subject_id: &SubjectId) -> Result<Option<[u8; 32]>>;

    /// Persist a record key for a subject.
    ///
    /// A no-op if a key already exists for the subject: the first writer
    /// wins, so racing creators converge on one key. Callers re-read after
    /// writing.
    async fn put_record_key(&self, subject_id: &SubjectId, key: &[u8; 32]) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Record Blobs
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the sealed record envelope for a subject.
    async fn get_record_blob(&self, subject_id: &SubjectId) -> Result<Option<Vec<u8>>>;

    /// Replace the sealed record envelope for a subject atomically.
    async fn put_record_blob(&self, subject_id: &SubjectId, blob: &[u8]) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Audit Log
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an audit event. Events are stored in insertion order.
    async fn append_audit(&self, event: &AuditEvent) -> Result<()>;

    /// The most recently appended audit event, if any.
    async fn last_audit(&self) -> Result<Option<AuditEvent>>;

    /// Load the full audit log in insertion order.
    async fn load_audit(&self) -> Result<Vec<AuditEvent>>;

    /// Load the audit events concerning a subject, in insertion order.
    async fn load_audit_for_subject(&self, subject_id: &SubjectId) -> Result<Vec<AuditEvent>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Access Ledger
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an access record.
    async fn append_access(&self, record: &AccessRecord) -> Result<()>;

    /// Load the access records for a subject, in insertion order.
    async fn load_access(&self, subject_id: &SubjectId) -> Result<Vec<AccessRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Slots
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a slot by id.
    async fn get_slot(&self, slot_id: &SlotId) -> Result<Option<Slot>>;

    /// Insert or replace a slot.
    async fn upsert_slot(&self, slot: &Slot) -> Result<()>;

    /// List all slots, ordered by (start time, slot id).
    async fn list_slots(&self) -> Result<Vec<Slot>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Facility Directory
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a facility by id.
    async fn get_facility(&self, facility_id: &FacilityId) -> Result<Option<Facility>>;

    /// Insert or replace a facility.
    async fn upsert_facility(&self, facility: &Facility) -> Result<()>;

    /// List all facilities, ordered by id.
    async fn list_facilities(&self) -> Result<Vec<Facility>>;
}
