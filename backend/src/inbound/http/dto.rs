//! Response bodies shared by several handler modules.
//!
//! Domain values are flattened to their wire form here: identifiers become
//! integers, validated strings become plain strings and prices become JSON
//! numbers with two decimal places.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BillingPeriod, Item, Role, Room, RoomSummary, User};

/// Account as shown to administrators and to its owner.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 2)]
    pub id: i64,
    #[schema(example = "bob")]
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "bob@example.org")]
    pub email: Option<String>,
    #[schema(value_type = String, example = "user")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.get(),
            username: user.username.into(),
            email: user.email.map(Into::into),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Room with its creation metadata.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Kitchen")]
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.get(),
            name: room.name.as_ref().to_owned(),
            description: room.description.as_ref().to_owned(),
            created_at: room.created_at,
            created_by: room.created_by.map(|id| id.get()),
        }
    }
}

/// Room listing entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryResponse {
    #[serde(flatten)]
    pub room: RoomResponse,
    #[schema(example = 4)]
    pub item_count: u64,
}

impl From<RoomSummary> for RoomSummaryResponse {
    fn from(summary: RoomSummary) -> Self {
        Self {
            room: summary.room.into(),
            item_count: summary.item_count,
        }
    }
}

/// Item with every stored field.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    #[schema(example = 5)]
    pub id: i64,
    #[schema(example = "Cola")]
    pub name: String,
    pub description: String,
    #[schema(example = 1)]
    pub room_id: i64,
    #[schema(example = "Kitchen")]
    pub room_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 1.5)]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.get(),
            name: item.name.as_ref().to_owned(),
            description: item.description.as_ref().to_owned(),
            room_id: item.room_id.get(),
            room_name: item.room_name.as_ref().to_owned(),
            price: item.price.amount(),
            created_at: item.created_at,
            created_by: item.created_by.map(|id| id.get()),
        }
    }
}

/// Billing period as listed and returned by mutations.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingPeriodResponse {
    #[schema(example = 3)]
    pub id: i64,
    #[schema(example = "March 2024")]
    pub name: String,
    #[schema(value_type = String, example = "2024-03-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, example = "2024-03-31")]
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
}

impl From<BillingPeriod> for BillingPeriodResponse {
    fn from(period: BillingPeriod) -> Self {
        Self {
            id: period.id.get(),
            name: period.name.as_ref().to_owned(),
            start_date: period.range.start(),
            end_date: period.range.end(),
            is_active: period.is_active,
            created_at: period.created_at,
            created_by: period.created_by.map(|id| id.get()),
        }
    }
}

/// Plain confirmation body for mutations without a resource to return.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "password updated")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
