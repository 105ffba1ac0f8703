//! Tamper-evident audit events and the coarse access ledger.
//!
//! Every audited action becomes an [`AuditEvent`] whose chain hash binds it
//! to the complete history before it. Verification recomputes the chain from
//! the zero hash and reports the first index where it diverges.

use serde::{Deserialize, Serialize};

use crate::canonical::audit_content_bytes;
use crate::error::CoreError;
use crate::hash::ChainHash;
use crate::types::{ActorId, EventId, FacilityId, SubjectId};

/// The closed set of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BookAppointment,
    CancelAppointment,
    RescheduleAppointment,
    AddTreatmentNote,
    UpdateConsent,
    ReadRecord,
    /// A read attempt rejected by the consent gate. Recorded so denied
    /// access is as visible as granted access.
    ReadRecordDenied,
    CreateSlot,
    UpdateSlot,
    CancelSlot,
}

impl AuditAction {
    /// Stable string form, part of the hashed event content.
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::BookAppointment => "book_appointment",
            AuditAction::CancelAppointment => "cancel_appointment",
            AuditAction::RescheduleAppointment => "reschedule_appointment",
            AuditAction::AddTreatmentNote => "add_treatment_note",
            AuditAction::UpdateConsent => "update_consent",
            AuditAction::ReadRecord => "read_record",
            AuditAction::ReadRecordDenied => "read_record_denied",
            AuditAction::CreateSlot => "create_slot",
            AuditAction::UpdateSlot => "update_slot",
            AuditAction::CancelSlot => "cancel_slot",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "book_appointment" => Some(AuditAction::BookAppointment),
            "cancel_appointment" => Some(AuditAction::CancelAppointment),
            "reschedule_appointment" => Some(AuditAction::RescheduleAppointment),
            "add_treatment_note" => Some(AuditAction::AddTreatmentNote),
            "update_consent" => Some(AuditAction::UpdateConsent),
            "read_record" => Some(AuditAction::ReadRecord),
            "read_record_denied" => Some(AuditAction::ReadRecordDenied),
            "create_slot" => Some(AuditAction::CreateSlot),
            "update_slot" => Some(AuditAction::UpdateSlot),
            "cancel_slot" => Some(AuditAction::CancelSlot),
            _ => None,
        }
    }
}

/// One entry of the append-only audit trail.
///
/// The chain hash is derived from the event's content hash and the previous
/// event's chain hash, so any rewrite of history invalidates every later
/// event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: EventId,

    /// Who performed the action.
    pub actor: ActorId,

    pub action: AuditAction,

    /// The patient the action concerns, when there is one. Slot
    /// administration on open slots has no subject.
    pub subject_id: Option<SubjectId>,

    pub timestamp_ms: i64,

    /// Binds this event to the whole history before it.
    pub chain_hash: ChainHash,
}

impl AuditEvent {
    /// Build the content of an event, before chaining. The chain hash is
    /// zero until [`AuditEvent::chained`] seals it against a predecessor.
    pub fn content(
        id: EventId,
        actor: ActorId,
        action: AuditAction,
        subject_id: Option<SubjectId>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            id,
            actor,
            action,
            subject_id,
            timestamp_ms,
            chain_hash: ChainHash::ZERO,
        }
    }

    /// Seal the event against the chain hash of the preceding event (or
    /// [`ChainHash::ZERO`] for the first event in the log).
    pub fn chained(mut self, prev: &ChainHash) -> Self {
        self.chain_hash = ChainHash::chain(&self.content_hash(), prev);
        self
    }

    /// The Blake3 hash of the event's canonical content bytes. The chain
    /// hash itself is not part of the content.
    pub fn content_hash(&self) -> ChainHash {
        ChainHash::hash(&audit_content_bytes(self))
    }
}

/// Verify an audit log slice against its chain, in order.
///
/// Returns `ChainBroken` with the index of the first event whose chain hash
/// does not match the recomputed value.
pub fn verify_chain(events: &[AuditEvent]) -> Result<(), CoreError> {
    let mut prev = ChainHash::ZERO;
    for (index, event) in events.iter().enumerate() {
        let expected = ChainHash::chain(&event.content_hash(), &prev);
        if event.chain_hash != expected {
            return Err(CoreError::ChainBroken { index });
        }
        prev = event.chain_hash;
    }
    Ok(())
}

/// One entry of the coarse access ledger: a facility touched a subject's
/// record at some time, through a consented read or a consent change.
/// Plaintext by design, never containing record content, so a patient can
/// review who dealt with their data without decrypting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub subject_id: SubjectId,
    pub facility_id: FacilityId,
    pub timestamp_ms: i64,
}
