//! Strong identifier types for the Praxis domain.
//!
//! All identifiers are newtypes to prevent misuse at compile time. Platform
//! identifiers are human-readable strings ("slot-001", "c-berlin-cardio");
//! audit event identifiers are random 16-byte values rendered as hex.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// View the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a subject (the patient whose record is stored).
    SubjectId
}

string_id! {
    /// Identifier of a bookable appointment slot.
    SlotId
}

string_id! {
    /// Identifier of a facility (clinic).
    FacilityId
}

string_id! {
    /// Identifier of a department within a facility.
    DepartmentId
}

string_id! {
    /// Identifier of a provider (treating clinician).
    ProviderId
}

string_id! {
    /// Identifier of an acting principal: a patient, staff member, or admin.
    ActorId
}

impl ActorId {
    /// Whether this actor is the given subject.
    ///
    /// Patients act under their subject identifier, so ownership checks
    /// compare across the two newtypes.
    pub fn is_subject(&self, subject: &SubjectId) -> bool {
        self.0 == subject.0
    }
}

impl From<&SubjectId> for ActorId {
    fn from(subject: &SubjectId) -> Self {
        Self(subject.0.clone())
    }
}

/// A 16-byte audit event identifier.
///
/// Random rather than content-derived: the content hash covers the id, so
/// deriving the id from the hash would be circular.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 16]);

impl EventId {
    /// Generate a fresh random event identifier.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.to_hex())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
