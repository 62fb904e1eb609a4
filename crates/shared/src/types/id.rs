//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `StudentId` where a `SchoolId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(SchoolId, "Unique identifier for a school (tenant).");
typed_id!(UserId, "Unique identifier for a user.");
typed_id!(SectionId, "Unique identifier for a school section.");
typed_id!(ClassId, "Unique identifier for a class.");
typed_id!(StudentId, "Unique identifier for a student.");
typed_id!(AcademicSessionId, "Unique identifier for an academic session.");
typed_id!(TermId, "Unique identifier for a term.");
typed_id!(FeeId, "Unique identifier for a fee rule.");
typed_id!(PaymentId, "Unique identifier for a gateway payment.");
typed_id!(TransactionId, "Unique identifier for a manual transaction.");
typed_id!(ExamId, "Unique identifier for an exam.");
typed_id!(SubjectId, "Unique identifier for a subject.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let uuid = Uuid::new_v4();
        let id: StudentId = uuid.to_string().parse().unwrap();
        assert_eq!(id.into_inner(), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(SchoolId::new(), SchoolId::new());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = FeeId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
