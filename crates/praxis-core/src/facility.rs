//! Facility directory types.
//!
//! The directory exists to validate and search slots; full directory
//! management is an external concern. Departments and providers live
//! inside their facility document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{DepartmentId, FacilityId, ProviderId};

/// Medical specialties supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Cardiology,
    Dermatology,
    GeneralPractice,
    Orthopedics,
    Pediatrics,
}

impl Specialty {
    /// Stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Specialty::Cardiology => "cardiology",
            Specialty::Dermatology => "dermatology",
            Specialty::GeneralPractice => "general_practice",
            Specialty::Orthopedics => "orthopedics",
            Specialty::Pediatrics => "pediatrics",
        }
    }
}

/// A department within a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub specialty: Specialty,
}

/// A treating clinician attached to a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub department_id: Option<DepartmentId>,
}

/// A clinic that owns bookable slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    pub city: String,
    pub street: String,
    pub postal_code: String,
    pub contact_email: String,

    /// Specialties offered facility-wide.
    pub specialties: BTreeSet<Specialty>,

    pub departments: Vec<Department>,
    pub providers: Vec<Provider>,
}

impl Facility {
    /// All specialties reachable at this facility, including through its
    /// departments.
    pub fn all_specialties(&self) -> BTreeSet<Specialty> {
        let mut set = self.specialties.clone();
        set.extend(self.departments.iter().map(|d| d.specialty));
        set
    }

    /// Whether the facility offers a specialty, directly or via a
    /// department.
    pub fn offers(&self, specialty: Specialty) -> bool {
        self.specialties.contains(&specialty)
            || self.departments.iter().any(|d| d.specialty == specialty)
    }

    /// Look up a department.
    pub fn department(&self, id: &DepartmentId) -> Option<&Department> {
        self.departments.iter().find(|d| &d.id == id)
    }

    /// Look up a provider.
    pub fn provider(&self, id: &ProviderId) -> Option<&Provider> {
        self.providers.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
                id: DepartmentId::new("d-echo"),
                name: "Echokardiographie".into(),
                specialty: Specialty::GeneralPractice,
            }],
            providers: vec![Provider {
                id: ProviderId::new("dr-weber"),
                name: "Dr. Weber".into(),
                department_id: Some(DepartmentId::new("d-echo")),
            }],
        }
    }

    #[test]
    fn test_offers_includes_department_specialties() {
        let f = facility();
        assert!(f.offers(Specialty::Cardiology));
        assert!(f.offers(Specialty::GeneralPractice));
        assert!(!f.offers(Specialty::Dermatology));
        assert_eq!(f.all_specialties().len(), 2);
    }

    #[test]
    fn test_lookups() {
        let f = facility();
        assert!(f.department(&DepartmentId::new("d-echo")).is_some());
        assert!(f.provider(&ProviderId::new("dr-weber")).is_some());
        assert!(f.provider(&ProviderId::new("dr-nobody")).is_none());
    }

    #[test]
    fn test_specialty_serde_snake_case() {
        let json = serde_json::to_string(&Specialty::GeneralPractice).unwrap();
        assert_eq!(json, "\"general_practice\"");
    }
}
