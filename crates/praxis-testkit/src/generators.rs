//! Proptest generators for property-based testing.

use proptest::prelude::*;

use praxis_core::{
    ActorId, AuditAction, AuditEvent, ChainHash, EventId, FacilityId, PatientProfile, Slot,
    SlotStatus, Specialty, SubjectId,
};

/// Generate a subject id.
pub fn subject_id() -> impl Strategy<Value = SubjectId> {
    "p-[a-z0-9]{4,12}".prop_map(SubjectId::new)
}

/// Generate a facility id.
pub fn facility_id() -> impl Strategy<Value = FacilityId> {
    "c-[a-z0-9]{4,12}".prop_map(FacilityId::new)
}

/// Generate an actor id.
pub fn actor_id() -> impl Strategy<Value = ActorId> {
    "[a-z]{2,8}-[0-9]{1,4}".prop_map(ActorId::new)
}

/// Generate a random event id.
pub fn event_id() -> impl Strategy<Value = EventId> {
    any::<[u8; 16]>().prop_map(EventId::from_bytes)
}

/// Generate a random chain hash.
pub fn chain_hash() -> impl Strategy<Value = ChainHash> {
    any::<[u8; 32]>().prop_map(ChainHash::from_bytes)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=1_700_000_000_000i64
}

/// Generate a specialty.
pub fn specialty() -> impl Strategy<Value = Specialty> {
    prop_oneof![
        Just(Specialty::Cardiology),
        Just(Specialty::Dermatology),
        Just(Specialty::GeneralPractice),
        Just(Specialty::Orthopedics),
        Just(Specialty::Pediatrics),
    ]
}

/// Generate a slot status.
pub fn slot_status() -> impl Strategy<Value = SlotStatus> {
    prop_oneof![
        Just(SlotStatus::Open),
        Just(SlotStatus::Booked),
        Just(SlotStatus::Cancelled),
    ]
}

/// Generate an audit action.
pub fn audit_action() -> impl Strategy<Value = AuditAction> {
    prop_oneof![
        Just(AuditAction::BookAppointment),
        Just(AuditAction::CancelAppointment),
        Just(AuditAction::RescheduleAppointment),
        Just(AuditAction::AddTreatmentNote),
        Just(AuditAction::UpdateConsent),
        Just(AuditAction::ReadRecord),
        Just(AuditAction::ReadRecordDenied),
        Just(AuditAction::CreateSlot),
        Just(AuditAction::UpdateSlot),
        Just(AuditAction::CancelSlot),
    ]
}

/// Generate a patient profile.
pub fn profile() -> impl Strategy<Value = PatientProfile> {
    (subject_id(), "[a-z]{3,10}", "[A-Z][a-z]{2,8}", "[A-Z][a-z]{2,10}").prop_map(
        |(id, user, first, last)| PatientProfile {
            id,
            email: format!("{user}@example.org"),
            first_name: first,
            last_name: last,
            date_of_birth: "1985-06-15".into(),
        },
    )
}

/// Generate an open slot with a valid half-open interval.
pub fn open_slot() -> impl Strategy<Value = Slot> {
    ("slot-[a-z0-9]{4,8}", facility_id(), timestamp(), 1i64..=86_400_000i64).prop_map(
        |(id, facility_id, start_ms, len_ms)| {
            Slot::new(id, facility_id, start_ms, start_ms + len_ms, false)
        },
    )
}

/// Parameters for one audit event, before chaining.
#[derive(Debug, Clone)]
pub struct EventParams {
    pub actor: ActorId,
    pub action: AuditAction,
    pub subject_id: Option<SubjectId>,
    pub timestamp_ms: i64,
}

impl Arbitrary for EventParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            actor_id(),
            audit_action(),
            prop::option::of(subject_id()),
            timestamp(),
        )
            .prop_map(|(actor, action, subject_id, timestamp_ms)| EventParams {
                actor,
                action,
                subject_id,
                timestamp_ms,
            })
            .boxed()
    }
}

/// Chain a sequence of event parameters into a valid audit log.
pub fn chain_events(params: &[EventParams]) -> Vec<AuditEvent> {
    let mut prev = ChainHash::ZERO;
    params
        .iter()
        .map(|p| {
            let event = AuditEvent::content(
                EventId::generate(),
                p.actor.clone(),
                p.action,
                p.subject_id.clone(),
                p.timestamp_ms,
            )
            .chained(&prev);
            prev = event.chain_hash;
            event
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::{verify_chain, PatientRecord};

    proptest! {
        #[test]
        fn prop_generated_chains_verify(params in prop::collection::vec(any::<EventParams>(), 0..24)) {
            let events = chain_events(&params);
            prop_assert!(verify_chain(&events).is_ok());
        }

        #[test]
        fn prop_timestamp_tamper_breaks_chain(
            params in prop::collection::vec(any::<EventParams>(), 1..16),
            index in any::<prop::sample::Index>(),
        ) {
            let mut events = chain_events(&params);
            let i = index.index(events.len());
            events[i].timestamp_ms = events[i].timestamp_ms.wrapping_add(1);
            prop_assert!(verify_chain(&events).is_err());
        }

        #[test]
        fn prop_consent_set_matches_replayed_operations(
            profile in profile(),
            ops in prop::collection::vec((facility_id(), any::<bool>()), 0..32),
        ) {
            let mut record = PatientRecord::new(profile);
            let mut model = std::collections::BTreeSet::new();
            for (facility, grant) in &ops {
                if *grant {
                    let changed = record.grant_consent(facility.clone());
                    prop_assert_eq!(changed, model.insert(facility.clone()));
                } else {
                    let changed = record.revoke_consent(facility);
                    prop_assert_eq!(changed, model.remove(facility));
                }
            }
            prop_assert_eq!(&record.consents, &model);
        }

        #[test]
        fn prop_open_slot_has_valid_interval(slot in open_slot()) {
            prop_assert!(slot.start_ms < slot.end_ms);
            prop_assert_eq!(slot.status, SlotStatus::Open);
            prop_assert!(slot.occupant.is_none());
        }
    }
}
