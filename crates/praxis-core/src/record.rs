//! The per-subject patient record.
//!
//! One record exists per patient, stored encrypted as a whole. All mutation
//! goes through methods on [`PatientRecord`] so the structural invariants
//! hold by construction: at most one appointment per slot, contiguous note
//! versions starting at 1, and a duplicate-free consent set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{ActorId, FacilityId, SlotId, SubjectId};

/// Minimal patient profile stored inside the encrypted record and
/// denormalized into booked slots as the notification snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Stable identifier of the patient.
    pub id: SubjectId,

    /// Contact address for confirmations.
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// ISO-8601 date (YYYY-MM-DD).
    pub date_of_birth: String,
}

/// A booked appointment as recorded inside the patient record.
///
/// Denormalized from the slot at booking time; kept in sync by the
/// coordinator when a facility later updates or cancels the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub slot_id: SlotId,
    pub facility_id: FacilityId,
    /// Start of the half-open interval, Unix milliseconds.
    pub start_ms: i64,
    /// End of the half-open interval, Unix milliseconds.
    pub end_ms: i64,
    pub is_virtual: bool,
}

/// A versioned treatment note written by medical staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentNote {
    /// Version within this record, contiguous from 1.
    pub version: u32,
    pub author: ActorId,
    pub created_at_ms: i64,
    pub summary: String,
    pub next_steps: Option<String>,
}

/// The complete per-subject record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub profile: PatientProfile,

    /// At most one entry per slot identifier.
    pub appointments: Vec<Appointment>,

    /// Versions are contiguous from 1, never reused or reordered.
    pub treatment_notes: Vec<TreatmentNote>,

    /// Facilities currently authorized to read this record.
    pub consents: BTreeSet<FacilityId>,
}

impl PatientRecord {
    /// Create an empty record for a subject. Records are created lazily on
    /// first booking or consent grant.
    pub fn new(profile: PatientProfile) -> Self {
        Self {
            profile,
            appointments: Vec::new(),
            treatment_notes: Vec::new(),
            consents: BTreeSet::new(),
        }
    }

    /// The subject this record belongs to.
    pub fn subject_id(&self) -> &SubjectId {
        &self.profile.id
    }

    /// Insert an appointment, replacing any existing entry with the same
    /// slot id (defensive dedup).
    pub fn upsert_appointment(&mut self, appointment: Appointment) {
        self.appointments.retain(|a| a.slot_id != appointment.slot_id);
        self.appointments.push(appointment);
    }

    /// Remove the appointment for a slot. Returns whether an entry existed.
    pub fn remove_appointment(&mut self, slot_id: &SlotId) -> bool {
        let before = self.appointments.len();
        self.appointments.retain(|a| &a.slot_id != slot_id);
        self.appointments.len() != before
    }

    /// Look up the appointment for a slot.
    pub fn appointment(&self, slot_id: &SlotId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| &a.slot_id == slot_id)
    }

    /// The version the next treatment note will get.
    pub fn next_note_version(&self) -> u32 {
        self.treatment_notes.last().map_or(1, |n| n.version + 1)
    }

    /// Append a treatment note with the next contiguous version.
    pub fn push_note(
        &mut self,
        author: ActorId,
        created_at_ms: i64,
        summary: impl Into<String>,
        next_steps: Option<String>,
    ) -> &TreatmentNote {
        let note = TreatmentNote {
            version: self.next_note_version(),
            author,
            created_at_ms,
            summary: summary.into(),
            next_steps,
        };
        self.treatment_notes.push(note);
        self.treatment_notes.last().expect("just pushed")
    }

    /// Grant a facility read consent. Returns whether the set changed.
    pub fn grant_consent(&mut self, facility_id: FacilityId) -> bool {
        self.consents.insert(facility_id)
    }

    /// Revoke a facility's read consent. Returns whether the set changed;
    /// revoking an absent consent is a no-op, not an error.
    pub fn revoke_consent(&mut self, facility_id: &FacilityId) -> bool {
        self.consents.remove(facility_id)
    }

    /// Whether the facility currently holds read consent.
    pub fn has_consent(&self, facility_id: &FacilityId) -> bool {
        self.consents.contains(facility_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PatientRecord {
        PatientRecord::new(PatientProfile {
            id: SubjectId::new("p-100"),
            email: "anna@example.org".into(),
            first_name: "Anna".into(),
            last_name: "Becker".into(),
            date_of_birth: "1987-03-14".into(),
        })
    }

    fn appointment(slot: &str, start_ms: i64) -> Appointment {
        Appointment {
            slot_id: SlotId::new(slot),
            facility_id: FacilityId::new("c-1"),
            start_ms,
            end_ms: start_ms + 1_800_000,
            is_virtual: false,
        }
    }

    #[test]
    fn test_upsert_appointment_dedups_by_slot() {
        let mut r = record();
        r.upsert_appointment(appointment("slot-001", 1000));
        r.upsert_appointment(appointment("slot-002", 2000));
        r.upsert_appointment(appointment("slot-001", 3000));

        assert_eq!(r.appointments.len(), 2);
        assert_eq!(r.appointment(&SlotId::new("slot-001")).unwrap().start_ms, 3000);
    }

    #[test]
    fn test_remove_appointment() {
        let mut r = record();
        r.upsert_appointment(appointment("slot-001", 1000));
        assert!(r.remove_appointment(&SlotId::new("slot-001")));
        assert!(!r.remove_appointment(&SlotId::new("slot-001")));
        assert!(r.appointments.is_empty());
    }

    #[test]
    fn test_note_versions_contiguous_from_one() {
        let mut r = record();
        assert_eq!(r.next_note_version(), 1);

        r.push_note(ActorId::new("dr-a"), 1000, "first", None);
        r.push_note(ActorId::new("dr-b"), 2000, "second", Some("follow up".into()));
        r.push_note(ActorId::new("dr-a"), 3000, "third", None);

        let versions: Vec<u32> = r.treatment_notes.iter().map(|n| n.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[test]
    fn test_consent_grant_revoke_idempotent() {
        let mut r = record();
        let clinic = FacilityId::new("c-1");

        assert!(r.grant_consent(clinic.clone()));
        assert!(!r.grant_consent(clinic.clone()));
        assert_eq!(r.consents.len(), 1);

        assert!(r.revoke_consent(&clinic));
        assert!(!r.revoke_consent(&clinic));
        assert!(!r.has_consent(&clinic));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut r = record();
        r.upsert_appointment(appointment("slot-001", 1000));
        r.push_note(ActorId::new("dr-a"), 1000, "note", None);
        r.grant_consent(FacilityId::new("c-1"));

        let json = serde_json::to_string(&r).unwrap();
        let back: PatientRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }

    proptest::proptest! {
        #[test]
        fn prop_note_versions_strictly_increasing(count in 0usize..32) {
            let mut r = record();
            for i in 0..count {
                let author = if i % 2 == 0 { "dr-a" } else { "dr-b" };
                r.push_note(ActorId::new(author), i as i64, format!("note {i}"), None);
            }
            for (i, note) in r.treatment_notes.iter().enumerate() {
                proptest::prop_assert_eq!(note.version, i as u32 + 1);
            }
        }
    }
}
