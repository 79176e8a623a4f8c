//! Rooms, items and prices.
//!
//! Names are compared case-insensitively: two rooms may not share a name in
//! any casing, and an item name is unique within its room in the same way.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::ids::{ItemId, RoomId, UserId};

/// Maximum room or item name length in characters.
pub const NAME_MAX: usize = 100;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 1000;

/// Validation errors for catalogue values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("price must not be negative")]
    NegativePrice,
    #[error("price is out of range")]
    PriceOutOfRange,
}

fn validated_name(raw: &str) -> Result<String, CatalogueValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CatalogueValidationError::EmptyName);
    }
    if trimmed.chars().count() > NAME_MAX {
        return Err(CatalogueValidationError::NameTooLong { max: NAME_MAX });
    }
    Ok(trimmed.to_owned())
}

macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Validate and trim a name.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, CatalogueValidationError> {
                validated_name(raw.as_ref()).map(Self)
            }

            /// Lower-cased form used for uniqueness checks.
            #[must_use]
            pub fn folded(&self) -> String {
                self.0.to_lowercase()
            }

            /// Case-insensitive equality.
            #[must_use]
            pub fn same_as(&self, other: &Self) -> bool {
                self.folded() == other.folded()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_name!(
    /// Display name of a room.
    RoomName
);
define_name!(
    /// Display name of an item.
    ItemName
);

/// Free-text description; trimmed, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description(String);

impl Description {
    /// Trim and validate a description. `None` yields an empty description.
    pub fn new(raw: Option<&str>) -> Result<Self, CatalogueValidationError> {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.chars().count() > DESCRIPTION_MAX {
            return Err(CatalogueValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Non-negative unit price with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// A free item.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate a price, rounding to whole cents.
    pub fn new(amount: Decimal) -> Result<Self, CatalogueValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(CatalogueValidationError::NegativePrice);
        }
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .is_none()
        {
            return Err(CatalogueValidationError::PriceOutOfRange);
        }
        Ok(Self(rounded))
    }

    /// Rebuild a price from its stored cent value.
    pub fn from_cents(cents: i64) -> Result<Self, CatalogueValidationError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Amount in whole cents.
    #[must_use]
    pub fn cents(self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED).to_i64().unwrap_or_default()
    }

    /// Decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Cost of `count` units, or `None` when it exceeds the decimal range.
    #[must_use]
    pub fn times(self, count: u64) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(count))
    }
}

/// A named grouping of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    pub description: Description,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// A room together with the number of items it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room: Room,
    pub item_count: u64,
}

/// Data required to create a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub name: RoomName,
    pub description: Description,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Partial room update; `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomChanges {
    pub name: Option<RoomName>,
    pub description: Option<Description>,
}

/// A consumable tracked by strokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: ItemName,
    pub description: Description,
    pub room_id: RoomId,
    /// Copy of the owning room's name, kept in sync with the room.
    pub room_name: RoomName,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Stroke statistics attached to an item in the administrative listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemStats {
    pub stroke_count: u64,
    pub last_stroke: Option<DateTime<Utc>>,
}

/// An item with its (optionally period-scoped) stroke statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemWithStats {
    pub item: Item,
    pub stats: ItemStats,
}

/// Reduced item view for non-admin callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberItem {
    pub id: ItemId,
    pub name: ItemName,
    pub description: Description,
    pub room_name: RoomName,
}

impl From<Item> for MemberItem {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            room_name: item.room_name,
        }
    }
}

/// Item listing projected for the caller's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemListing {
    /// Every field plus stroke statistics.
    Admin(Vec<ItemWithStats>),
    /// Identity, description and room only.
    Member(Vec<MemberItem>),
}

/// Data required to create an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: ItemName,
    pub description: Description,
    pub room_id: RoomId,
    pub price: Price,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Partial item update; `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemChanges {
    pub name: Option<ItemName>,
    pub description: Option<Description>,
    pub room_id: Option<RoomId>,
    pub price: Option<Price>,
}

impl ItemChanges {
    /// Whether the update touches nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.room_id.is_none()
            && self.price.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).expect("decimal literal")
    }

    #[rstest]
    fn room_names_are_trimmed() {
        let name = RoomName::new("  Kitchen ").expect("valid name");
        assert_eq!(name.to_string(), "Kitchen");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_names_are_rejected(#[case] raw: &str) {
        assert_eq!(RoomName::new(raw), Err(CatalogueValidationError::EmptyName));
    }

    #[rstest]
    fn names_compare_case_insensitively() {
        let a = ItemName::new("Cola").expect("valid");
        let b = ItemName::new("COLA").expect("valid");
        assert!(a.same_as(&b));
        assert_ne!(a, b);
    }

    #[rstest]
    fn name_length_is_bounded() {
        let raw = "x".repeat(NAME_MAX + 1);
        assert_eq!(
            ItemName::new(raw),
            Err(CatalogueValidationError::NameTooLong { max: NAME_MAX })
        );
    }

    #[rstest]
    fn missing_description_is_empty() {
        let description = Description::new(None).expect("valid");
        assert_eq!(description.as_ref(), "");
    }

    #[rstest]
    #[case("1.5", 150)]
    #[case("0", 0)]
    #[case("2.345", 235)]
    #[case("2.344", 234)]
    fn prices_round_to_cents(#[case] raw: &str, #[case] cents: i64) {
        let price = Price::new(dec(raw)).expect("valid price");
        assert_eq!(price.cents(), cents);
    }

    #[rstest]
    fn negative_prices_are_rejected() {
        assert_eq!(
            Price::new(dec("-0.01")),
            Err(CatalogueValidationError::NegativePrice)
        );
    }

    #[rstest]
    fn cost_multiplies_by_count() {
        let price = Price::from_cents(150).expect("valid price");
        assert_eq!(price.times(3), Some(dec("4.50")));
    }
}
