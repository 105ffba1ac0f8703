//! Slot: a bookable appointment unit with a three-state lifecycle.
//!
//! Transitions are pure functions on the value; the registry drives them
//! under per-slot locks and persists the result. The occupant and its
//! profile snapshot travel together in [`Occupant`], so "booked implies
//! both set" holds by construction.

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::record::{Appointment, PatientProfile};
use crate::types::{DepartmentId, FacilityId, ProviderId, SlotId, SubjectId};

/// The lifecycle status of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Available for booking.
    Open,
    /// Held by exactly one subject.
    Booked,
    /// Withdrawn by facility staff; never re-opened automatically.
    Cancelled,
}

impl SlotStatus {
    /// Stable string form, used in storage columns.
    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Open => "open",
            SlotStatus::Booked => "booked",
            SlotStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(SlotStatus::Open),
            "booked" => Some(SlotStatus::Booked),
            "cancelled" => Some(SlotStatus::Cancelled),
            _ => None,
        }
    }
}

/// The subject holding a booked slot, with the denormalized profile
/// snapshot used for notification without touching the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub subject_id: SubjectId,
    pub snapshot: PatientProfile,
}

impl Occupant {
    /// Build an occupant from a profile; the subject id is the profile's.
    pub fn from_profile(snapshot: PatientProfile) -> Self {
        Self {
            subject_id: snapshot.id.clone(),
            snapshot,
        }
    }
}

/// A bookable appointment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub facility_id: FacilityId,
    pub department_id: Option<DepartmentId>,
    pub provider_id: Option<ProviderId>,

    /// Start of the half-open interval [start, end), Unix milliseconds.
    pub start_ms: i64,
    /// End of the half-open interval, Unix milliseconds.
    pub end_ms: i64,

    /// Whether the appointment takes place virtually (telemedicine).
    pub is_virtual: bool,

    pub status: SlotStatus,

    /// Present exactly when `status == Booked`.
    pub occupant: Option<Occupant>,
}

/// An in-place edit of a slot's schedulable fields.
///
/// Status and occupant are never touched by a patch; time changes on a
/// booked slot are propagated into the occupant's record by the
/// coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPatch {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub is_virtual: Option<bool>,
    pub department_id: Option<DepartmentId>,
    pub provider_id: Option<ProviderId>,
}

impl SlotPatch {
    /// Whether the patch changes the slot's time interval.
    pub fn touches_schedule(&self) -> bool {
        self.start_ms.is_some() || self.end_ms.is_some() || self.is_virtual.is_some()
    }
}

impl Slot {
    /// Create a new open slot.
    pub fn new(
        id: impl Into<SlotId>,
        facility_id: impl Into<FacilityId>,
        start_ms: i64,
        end_ms: i64,
        is_virtual: bool,
    ) -> Self {
        Self {
            id: id.into(),
            facility_id: facility_id.into(),
            department_id: None,
            provider_id: None,
            start_ms,
            end_ms,
            is_virtual,
            status: SlotStatus::Open,
            occupant: None,
        }
    }

    /// Attach a department.
    pub fn with_department(mut self, department_id: impl Into<DepartmentId>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    /// Attach a provider.
    pub fn with_provider(mut self, provider_id: impl Into<ProviderId>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Book the slot for an occupant: open -> booked.
    pub fn book(&mut self, occupant: Occupant) -> Result<(), TransitionError> {
        if self.status != SlotStatus::Open {
            return Err(TransitionError::NotBookable {
                slot: self.id.clone(),
                status: self.status,
            });
        }
        self.status = SlotStatus::Booked;
        self.occupant = Some(occupant);
        Ok(())
    }

    /// Free the slot: any state -> open, clearing the occupant.
    ///
    /// Release is also used to free a slot ahead of rebooking, so it is
    /// legal from any prior state. Returns the evicted occupant, if any.
    pub fn release(&mut self) -> Option<Occupant> {
        self.status = SlotStatus::Open;
        self.occupant.take()
    }

    /// Withdraw the slot: any state -> cancelled, clearing the occupant.
    ///
    /// Terminal under registry operations; facility staff recreate a new
    /// slot instead of re-opening a cancelled one. Returns the evicted
    /// occupant, if any.
    pub fn cancel(&mut self) -> Option<Occupant> {
        self.status = SlotStatus::Cancelled;
        self.occupant.take()
    }

    /// Apply an in-place edit, preserving status and occupant.
    pub fn apply_patch(&mut self, patch: &SlotPatch) {
        if let Some(start_ms) = patch.start_ms {
            self.start_ms = start_ms;
        }
        if let Some(end_ms) = patch.end_ms {
            self.end_ms = end_ms;
        }
        if let Some(is_virtual) = patch.is_virtual {
            self.is_virtual = is_virtual;
        }
        if let Some(department_id) = &patch.department_id {
            self.department_id = Some(department_id.clone());
        }
        if let Some(provider_id) = &patch.provider_id {
            self.provider_id = Some(provider_id.clone());
        }
    }

    /// The record-side appointment entry for this slot.
    pub fn to_appointment(&self) -> Appointment {
        Appointment {
            slot_id: self.id.clone(),
            facility_id: self.facility_id.clone(),
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            is_virtual: self.is_virtual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PatientProfile {
        PatientProfile {
            id: SubjectId::new("p-100"),
            email: "anna@example.org".into(),
            first_name: "Anna".into(),
            last_name: "Becker".into(),
            date_of_birth: "1987-03-14".into(),
        }
    }

    fn slot() -> Slot {
        Slot::new("slot-001", "c-1", 1_000, 2_000, false)
    }

    #[test]
    fn test_book_open_slot() {
        let mut s = slot();
        s.book(Occupant::from_profile(profile())).unwrap();
        assert_eq!(s.status, SlotStatus::Booked);
        assert_eq!(
            s.occupant.as_ref().unwrap().subject_id,
            SubjectId::new("p-100")
        );
    }

    #[test]
    fn test_book_booked_slot_fails_and_preserves_state() {
        let mut s = slot();
        s.book(Occupant::from_profile(profile())).unwrap();

        let mut other = profile();
        other.id = SubjectId::new("p-200");
        let err = s.book(Occupant::from_profile(other)).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::NotBookable {
                status: SlotStatus::Booked,
                ..
            }
        ));
        // First occupant still holds the slot.
        assert_eq!(
            s.occupant.as_ref().unwrap().subject_id,
            SubjectId::new("p-100")
        );
    }

    #[test]
    fn test_book_cancelled_slot_fails() {
        let mut s = slot();
        s.cancel();
        assert!(s.book(Occupant::from_profile(profile())).is_err());
    }

    #[test]
    fn test_release_clears_occupant_from_any_state() {
        let mut s = slot();
        s.book(Occupant::from_profile(profile())).unwrap();
        let evicted = s.release();
        assert_eq!(s.status, SlotStatus::Open);
        assert!(s.occupant.is_none());
        assert_eq!(evicted.unwrap().subject_id, SubjectId::new("p-100"));

        // Release on an already-open slot is a no-op that stays open.
        assert!(s.release().is_none());
        assert_eq!(s.status, SlotStatus::Open);
    }

    #[test]
    fn test_cancel_is_terminal_for_booking() {
        let mut s = slot();
        s.book(Occupant::from_profile(profile())).unwrap();
        let evicted = s.cancel();
        assert_eq!(s.status, SlotStatus::Cancelled);
        assert!(evicted.is_some());
        assert!(s.occupant.is_none());
        assert!(s.book(Occupant::from_profile(profile())).is_err());
    }

    #[test]
    fn test_patch_preserves_status_and_occupant() {
        let mut s = slot();
        s.book(Occupant::from_profile(profile())).unwrap();

        let patch = SlotPatch {
            start_ms: Some(5_000),
            end_ms: Some(6_000),
            is_virtual: Some(true),
            ..Default::default()
        };
        assert!(patch.touches_schedule());
        s.apply_patch(&patch);

        assert_eq!(s.start_ms, 5_000);
        assert!(s.is_virtual);
        assert_eq!(s.status, SlotStatus::Booked);
        assert!(s.occupant.is_some());
    }

    #[test]
    fn test_to_appointment_mirrors_slot() {
        let s = slot();
        let a = s.to_appointment();
        assert_eq!(a.slot_id, s.id);
        assert_eq!(a.facility_id, s.facility_id);
        assert_eq!((a.start_ms, a.end_ms), (s.start_ms, s.end_ms));
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [SlotStatus::Open, SlotStatus::Booked, SlotStatus::Cancelled] {
            assert_eq!(SlotStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SlotStatus::parse("held"), None);
    }
}
