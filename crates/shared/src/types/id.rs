//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `LeaveId` where a `GroupId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

typed_id!(UserId, "Unique identifier for a user profile (the identity subject).");
typed_id!(OrganizationId, "Unique identifier for an organization.");
typed_id!(LeaveId, "Unique identifier for a leave request.");
typed_id!(GroupId, "Unique identifier for an approval group.");
typed_id!(CompOffId, "Unique identifier for a comp-off grant record.");
typed_id!(
    UserCompOffId,
    "Unique identifier for one recipient row of a comp-off grant."
);
typed_id!(HolidayId, "Unique identifier for a public holiday.");
typed_id!(ArchiveId, "Unique identifier for a leave archive row.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
