//! Numeric identifiers for persisted entities.
//!
//! Identifiers are allocated by the store. They are plain positive integers
//! on the wire and in the database.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a path or query segment is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be a positive integer")]
pub struct InvalidIdentifier;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier value.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw identifier value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(InvalidIdentifier),
                }
            }
        }
    };
}

define_id!(
    /// Identifier of a user account.
    UserId
);
define_id!(
    /// Identifier of a room.
    RoomId
);
define_id!(
    /// Identifier of an item.
    ItemId
);
define_id!(
    /// Identifier of a single stroke.
    StrokeId
);
define_id!(
    /// Identifier of a billing period.
    BillingPeriodId
);

/// The seeded administrator; never deletable.
pub const BOOTSTRAP_ADMIN_ID: UserId = UserId::new(1);

/// The default room; never deletable.
pub const DEFAULT_ROOM_ID: RoomId = RoomId::new(1);
