//! Query types for slot and facility search.
//!
//! Queries are plain filter structs; matching against facilities is pure,
//! so the policy is testable without a store. Specialty filtering resolves
//! through the slot's department when it has one, falling back to the
//! facility-wide specialty set.

use praxis_core::{DepartmentId, Facility, FacilityId, ProviderId, Slot, Specialty, SlotStatus};

/// A filter over bookable slots.
///
/// By default only open slots match; booked and cancelled slots are
/// opt-in for facility-side views.
#[derive(Debug, Clone, Default)]
pub struct SlotQuery {
    pub facility_id: Option<FacilityId>,
    pub department_id: Option<DepartmentId>,
    pub provider_id: Option<ProviderId>,
    pub specialty: Option<Specialty>,

    /// Earliest acceptable start (inclusive), Unix milliseconds.
    pub starts_after_ms: Option<i64>,

    pub include_booked: bool,
    pub include_cancelled: bool,
}

impl SlotQuery {
    /// A query matching all open slots.
    pub fn open() -> Self {
        Self::default()
    }

    /// Restrict to a facility.
    pub fn facility(mut self, facility_id: impl Into<FacilityId>) -> Self {
        self.facility_id = Some(facility_id.into());
        self
    }

    /// Restrict to a department.
    pub fn department(mut self, department_id: impl Into<DepartmentId>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    /// Restrict to a provider.
    pub fn provider(mut self, provider_id: impl Into<ProviderId>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Restrict to a specialty.
    pub fn specialty(mut self, specialty: Specialty) -> Self {
        self.specialty = Some(specialty);
        self
    }

    /// Restrict to slots starting at or after the given time.
    pub fn starts_after(mut self, ms: i64) -> Self {
        self.starts_after_ms = Some(ms);
        self
    }

    /// Include booked slots in the result.
    pub fn with_booked(mut self) -> Self {
        self.include_booked = true;
        self
    }

    /// Include cancelled slots in the result.
    pub fn with_cancelled(mut self) -> Self {
        self.include_cancelled = true;
        self
    }

    /// Whether a slot matches this query. `facility` is the slot's own
    /// facility, needed only for specialty filtering; pass `None` when the
    /// query has no specialty filter.
    pub fn matches(&self, slot: &Slot, facility: Option<&Facility>) -> bool {
        match slot.status {
            SlotStatus::Open => {}
            SlotStatus::Booked if self.include_booked => {}
            SlotStatus::Cancelled if self.include_cancelled => {}
            _ => return false,
        }

        if let Some(facility_id) = &self.facility_id {
            if &slot.facility_id != facility_id {
                return false;
            }
        }
        if let Some(department_id) = &self.department_id {
            if slot.department_id.as_ref() != Some(department_id) {
                return false;
            }
        }
        if let Some(provider_id) = &self.provider_id {
            if slot.provider_id.as_ref() != Some(provider_id) {
                return false;
            }
        }
        if let Some(after) = self.starts_after_ms {
            if slot.start_ms < after {
                return false;
            }
        }
        if let Some(specialty) = self.specialty {
            let Some(facility) = facility else {
                return false;
            };
            let department_specialty = slot
                .department_id
                .as_ref()
                .and_then(|d| facility.department(d))
                .map(|d| d.specialty);
            match department_specialty {
                Some(s) => {
                    if s != specialty {
                        return false;
                    }
                }
                None => {
                    if !facility.offers(specialty) {
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// A filter over the facility directory.
#[derive(Debug, Clone, Default)]
pub struct FacilityQuery {
    pub specialty: Option<Specialty>,
    pub city: Option<String>,
}

impl FacilityQuery {
    /// A query matching all facilities.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to facilities offering a specialty.
    pub fn specialty(mut self, specialty: Specialty) -> Self {
        self.specialty = Some(specialty);
        self
    }

    /// Restrict to a city (case-insensitive).
    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Whether a facility matches this query.
    pub fn matches(&self, facility: &Facility) -> bool {
        if let Some(specialty) = self.specialty {
            if !facility.offers(specialty) {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if !facility.city.eq_ignore_ascii_case(city) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::{Department, Occupant, PatientProfile, SubjectId};
    use std::collections::BTreeSet;

    fn facility() -> Facility {
        Facility {
            id: FacilityId::new("c-berlin-cardio"),
            name: "GesundHerz Zentrum".into(),
            city: "Berlin".into(),
            street: "Friedrichstraße 12".into(),
            postal_code: "10117".into(),
            contact_email: "kontakt@gesundherz.de".into(),
            specialties: BTreeSet::from([Specialty::Cardiology]),
            departments: vec![Department {
                id: DepartmentId::new("d-allg"),
                name: "Allgemeinmedizin".into(),
                specialty: Specialty::GeneralPractice,
            }],
            providers: Vec::new(),
        }
    }

    fn occupant() -> Occupant {
        Occupant::from_profile(PatientProfile {
            id: SubjectId::new("p-100"),
            email: "anna@example.org".into(),
            first_name: "Anna".into(),
            last_name: "Becker".into(),
            date_of_birth: "1987-03-14".into(),
        })
    }

    #[test]
    fn test_default_query_excludes_non_open() {
        let mut slot = Slot::new("slot-001", "c-berlin-cardio", 1_000, 2_000, false);
        let query = SlotQuery::open();
        assert!(query.matches(&slot, None));

        slot.book(occupant()).unwrap();
        assert!(!query.matches(&slot, None));
        assert!(query.clone().with_booked().matches(&slot, None));

        slot.cancel();
        assert!(!query.matches(&slot, None));
        assert!(query.with_cancelled().matches(&slot, None));
    }

    #[test]
    fn test_facility_and_time_filters() {
        let slot = Slot::new("slot-001", "c-berlin-cardio", 5_000, 6_000, false);

        assert!(SlotQuery::open()
            .facility("c-berlin-cardio")
            .matches(&slot, None));
        assert!(!SlotQuery::open()
            .facility("c-hamburg-derma")
            .matches(&slot, None));
        assert!(SlotQuery::open().starts_after(5_000).matches(&slot, None));
        assert!(!SlotQuery::open().starts_after(5_001).matches(&slot, None));
    }

    #[test]
    fn test_specialty_resolves_through_department() {
        let facility = facility();
        let plain = Slot::new("slot-001", "c-berlin-cardio", 1_000, 2_000, false);
        let departmental = Slot::new("slot-002", "c-berlin-cardio", 1_000, 2_000, false)
            .with_department("d-allg");

        // Without a department the facility-wide set applies.
        let cardio = SlotQuery::open().specialty(Specialty::Cardiology);
        assert!(cardio.matches(&plain, Some(&facility)));

        // A departmental slot carries its department's specialty.
        assert!(!cardio.matches(&departmental, Some(&facility)));
        let general = SlotQuery::open().specialty(Specialty::GeneralPractice);
        assert!(general.matches(&departmental, Some(&facility)));

        // Specialty filter without facility context never matches.
        assert!(!cardio.matches(&plain, None));
    }

    #[test]
    fn test_facility_query() {
        let facility = facility();
        assert!(FacilityQuery::all().matches(&facility));
        assert!(FacilityQuery::all()
            .specialty(Specialty::Cardiology)
            .matches(&facility));
        assert!(!FacilityQuery::all()
            .specialty(Specialty::Dermatology)
            .matches(&facility));
        assert!(FacilityQuery::all().city("berlin").matches(&facility));
        assert!(!FacilityQuery::all().city("Hamburg").matches(&facility));
    }
}
