//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a seeded facility directory,
//! a handful of open slots, and ready-made identities for every role.

use std::collections::BTreeSet;
use std::sync::Arc;

use praxis::{BookingCoordinator, MemoryNotifier};
use praxis_core::{
    Department, DepartmentId, Facility, FacilityId, Identity, PatientProfile, Provider,
    ProviderId, Role, Slot, Specialty, SubjectId,
};
use praxis_store::{MemoryStore, Store};
use rand::Rng;

/// A test fixture with a seeded platform over an in-memory store.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<MemoryNotifier>,
    pub platform: BookingCoordinator<MemoryStore, Arc<MemoryNotifier>>,
}

impl TestFixture {
    /// A platform over an empty store.
    pub fn empty() -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let platform = BookingCoordinator::new(store.clone(), notifier.clone());
        Self {
            store,
            notifier,
            platform,
        }
    }

    /// A platform with the seed directory and slots already in place.
    ///
    /// Seeding writes to the store directly, so the audit log starts
    /// empty and tests can count events from zero.
    pub async fn seeded() -> Self {
        let fixture = Self::empty();
        for facility in seed_facilities() {
            fixture.store.upsert_facility(&facility).await.unwrap();
        }
        for slot in seed_slots() {
            fixture.store.upsert_slot(&slot).await.unwrap();
        }
        fixture
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::empty()
    }
}

/// The seed facility directory: one cardiology clinic in Berlin, one
/// dermatology clinic in Hamburg.
pub fn seed_facilities() -> Vec<Facility> {
    vec![berlin_cardio(), hamburg_derma()]
}

/// "GesundHerz Zentrum", Berlin. Cardiology, one department, one provider.
pub fn berlin_cardio() -> Facility {
    Facility {
        id: FacilityId::new("c-berlin-cardio"),
        name: "GesundHerz Zentrum".into(),
        city: "Berlin".into(),
        street: "Friedrichstraße 12".into(),
        postal_code: "10117".into(),
        contact_email: "kontakt@gesundherz.de".into(),
        specialties: BTreeSet::from([Specialty::Cardiology]),
        departments: vec![Department {
            id: DepartmentId::new("d-kardio"),
            name: "Kardiologie".into(),
            specialty: Specialty::Cardiology,
        }],
        providers: vec![Provider {
            id: ProviderId::new("dr-weber"),
            name: "Dr. med. Katrin Weber".into(),
            department_id: Some(DepartmentId::new("d-kardio")),
        }],
    }
}

/// "Hanse Derma Klinik", Hamburg. Dermatology, no departments.
pub fn hamburg_derma() -> Facility {
    Facility {
        id: FacilityId::new("c-hamburg-derma"),
        name: "Hanse Derma Klinik".into(),
        city: "Hamburg".into(),
        street: "Mönckebergstraße 3".into(),
        postal_code: "20095".into(),
        contact_email: "praxis@hansederma.de".into(),
        specialties: BTreeSet::from([Specialty::Dermatology]),
        departments: Vec::new(),
        providers: vec![Provider {
            id: ProviderId::new("dr-schmidt"),
            name: "Dr. med. Jonas Schmidt".into(),
            department_id: None,
        }],
    }
}

/// The seed slots: two in Berlin on 2024-06-25, one in Hamburg the next
/// morning. All open.
pub fn seed_slots() -> Vec<Slot> {
    vec![
        // 2024-06-25 09:00–09:30 UTC
        Slot::new(
            "slot-001",
            "c-berlin-cardio",
            1_719_306_000_000,
            1_719_307_800_000,
            false,
        )
        .with_department("d-kardio")
        .with_provider("dr-weber"),
        // 2024-06-25 10:00–10:30 UTC, telemedicine
        Slot::new(
            "slot-002",
            "c-berlin-cardio",
            1_719_309_600_000,
            1_719_311_400_000,
            true,
        )
        .with_provider("dr-weber"),
        // 2024-06-26 14:00–14:30 UTC
        Slot::new(
            "slot-003",
            "c-hamburg-derma",
            1_719_410_400_000,
            1_719_412_200_000,
            false,
        )
        .with_provider("dr-schmidt"),
    ]
}

/// Patient Anna Becker, subject "p-100".
pub fn anna() -> Identity {
    Identity::patient(PatientProfile {
        id: SubjectId::new("p-100"),
        email: "anna.becker@example.org".into(),
        first_name: "Anna".into(),
        last_name: "Becker".into(),
        date_of_birth: "1987-03-14".into(),
    })
}

/// Patient Ben Fischer, subject "p-200".
pub fn ben() -> Identity {
    Identity::patient(PatientProfile {
        id: SubjectId::new("p-200"),
        email: "ben.fischer@example.org".into(),
        first_name: "Ben".into(),
        last_name: "Fischer".into(),
        date_of_birth: "1990-07-01".into(),
    })
}

/// A patient with a random subject id, for tests that need many.
pub fn random_patient() -> Identity {
    let suffix: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    Identity::patient(PatientProfile {
        id: SubjectId::new(format!("p-{suffix}")),
        email: format!("{suffix}@example.org"),
        first_name: "Test".into(),
        last_name: "Patient".into(),
        date_of_birth: "1980-01-01".into(),
    })
}

/// Clinic admin at the Berlin cardiology clinic.
pub fn berlin_admin() -> Identity {
    Identity::staff(
        "staff-berlin-1",
        Role::ClinicAdmin,
        FacilityId::new("c-berlin-cardio"),
    )
}

/// Treating provider at the Berlin cardiology clinic.
pub fn berlin_provider() -> Identity {
    Identity::staff(
        "dr-weber",
        Role::Provider,
        FacilityId::new("c-berlin-cardio"),
    )
}

/// Treating provider at the Hamburg dermatology clinic.
pub fn hamburg_provider() -> Identity {
    Identity::staff(
        "dr-schmidt",
        Role::Provider,
        FacilityId::new("c-hamburg-derma"),
    )
}

/// Platform operator.
pub fn platform_admin() -> Identity {
    Identity::platform_admin("ops-1")
}
