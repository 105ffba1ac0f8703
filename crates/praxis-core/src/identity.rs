//! Pre-authenticated actor identity.
//!
//! Authentication happens outside this core; use cases receive an [`Identity`]
//! that the surrounding layer has already validated. The role set is a closed
//! enum so that adding a role is a compile-time-checked change everywhere a
//! role is matched.

use serde::{Deserialize, Serialize};

use crate::record::PatientProfile;
use crate::types::{ActorId, FacilityId};

/// The role an actor holds on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A patient acting on their own record.
    Patient,
    /// A treating clinician attached to a facility.
    Provider,
    /// Administrative staff of a facility.
    ClinicAdmin,
    /// Platform operator with oversight access.
    PlatformAdmin,
}

impl Role {
    /// Stable string form, used in audit rendering.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Provider => "provider",
            Role::ClinicAdmin => "clinic_admin",
            Role::PlatformAdmin => "platform_admin",
        }
    }

    /// Whether this role acts on behalf of a facility.
    pub fn is_facility_staff(self) -> bool {
        matches!(self, Role::Provider | Role::ClinicAdmin)
    }
}

/// A pre-authenticated actor.
///
/// `facility_id` is set for facility staff; `profile` is attached for
/// patients so that bookings can create the record lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The acting principal.
    pub id: ActorId,

    /// The actor's role.
    pub role: Role,

    /// The facility the actor works for, if any.
    pub facility_id: Option<FacilityId>,

    /// The patient profile, attached for patient actors.
    pub profile: Option<PatientProfile>,
}

impl Identity {
    /// A patient identity carrying its profile.
    pub fn patient(profile: PatientProfile) -> Self {
        Self {
            id: ActorId::from(&profile.id),
            role: Role::Patient,
            facility_id: None,
            profile: Some(profile),
        }
    }

    /// A facility staff identity.
    pub fn staff(id: impl Into<ActorId>, role: Role, facility_id: FacilityId) -> Self {
        Self {
            id: id.into(),
            role,
            facility_id: Some(facility_id),
            profile: None,
        }
    }

    /// A platform admin identity.
    pub fn platform_admin(id: impl Into<ActorId>) -> Self {
        Self {
            id: id.into(),
            role: Role::PlatformAdmin,
            facility_id: None,
            profile: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubjectId;

    fn profile() -> PatientProfile {
        PatientProfile {
            id: SubjectId::new("p-100"),
            email: "anna@example.org".into(),
            first_name: "Anna".into(),
            last_name: "Becker".into(),
            date_of_birth: "1987-03-14".into(),
        }
    }

    #[test]
    fn test_patient_identity_carries_profile() {
        let identity = Identity::patient(profile());
        assert_eq!(identity.role, Role::Patient);
        assert!(identity.id.is_subject(&SubjectId::new("p-100")));
        assert!(identity.profile.is_some());
        assert!(identity.facility_id.is_none());
    }

    #[test]
    fn test_staff_roles() {
        let admin = Identity::staff("staff-1", Role::ClinicAdmin, FacilityId::new("c-1"));
        assert!(admin.role.is_facility_staff());
        assert!(!Role::Patient.is_facility_staff());
        assert!(!Role::PlatformAdmin.is_facility_staff());
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::ClinicAdmin).unwrap();
        assert_eq!(json, "\"clinic_admin\"");
    }
}
