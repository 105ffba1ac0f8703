//! The consent gate: pure read-authorization policy.
//!
//! Every decrypted read of a patient record passes through [`ConsentGate`].
//! The gate is a pure function of the record and the requesting identity,
//! so the policy is testable without storage or crypto.

use praxis_core::{Identity, PatientRecord, Role};

/// Decides whether an identity may read a patient record.
pub struct ConsentGate;

impl ConsentGate {
    /// Whether `identity` may read `record`.
    ///
    /// - Patients read their own record, never anyone else's.
    /// - Facility staff read records whose consent set currently contains
    ///   their facility. Role within the facility does not matter here;
    ///   consent is granted to the facility as a whole.
    /// - Platform admins have oversight access.
    ///
    /// The match on role is exhaustive so a new role cannot silently fall
    /// through to an allow.
    pub fn may_read(record: &PatientRecord, identity: &Identity) -> bool {
        match identity.role {
            Role::Patient => identity.id.is_subject(record.subject_id()),
            Role::Provider | Role::ClinicAdmin => identity
                .facility_id
                .as_ref()
                .is_some_and(|facility| record.has_consent(facility)),
            Role::PlatformAdmin => true,
        }
    }
}
