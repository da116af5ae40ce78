//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `LocationId` where a `WarehouseId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

typed_id!(MovementId, "Unique identifier for an inventory movement.");
typed_id!(MovementLineId, "Unique identifier for a movement line.");
typed_id!(MovementTaskId, "Unique identifier for a movement task.");
typed_id!(ItemId, "Unique identifier for a stocked item.");
typed_id!(LocationId, "Unique identifier for a storage location.");
typed_id!(WarehouseId, "Unique identifier for a warehouse.");
typed_id!(SiteId, "Unique identifier for a site.");
typed_id!(UserId, "Unique identifier for a user.");
typed_id!(LotId, "Unique identifier for a lot or batch.");
