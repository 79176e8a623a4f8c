//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; each adapter converts them into
//! validated domain values and reports rows that fail validation as query
//! errors.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::{
    BillingPeriod, BillingPeriodId, DateRange, Description, EmailAddress, Item, ItemId, ItemName,
    PasswordDigest, PeriodName, Price, Role, Room, RoomId, RoomName, Stroke, StrokeId, User,
    UserAccount, UserId, Username,
};

use super::schema::{billing_periods, items, rooms, settings, strokes, users};

/// Message describing a stored row that no longer passes domain validation.
fn corrupt(table: &str, id: i64, error: impl std::fmt::Display) -> String {
    format!("{table} row {id} is invalid: {error}")
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_digest: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub password_digest: &'a str,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Used by legacy import and seeding, which preserve or fix the id.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct UserWithIdRow<'a> {
    pub id: i64,
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub password_digest: &'a str,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = settings)]
pub(crate) struct SettingRow<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoomRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rooms)]
pub(crate) struct NewRoomRow<'a> {
    pub id: Option<i64>,
    pub name: &'a str,
    pub description: &'a str,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = rooms)]
pub(crate) struct RoomUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub room_id: i64,
    pub room_name: String,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = items)]
pub(crate) struct NewItemRow<'a> {
    pub id: Option<i64>,
    pub name: &'a str,
    pub description: &'a str,
    pub room_id: i64,
    pub room_name: &'a str,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = items)]
pub(crate) struct ItemUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub room_id: Option<i64>,
    pub room_name: Option<&'a str>,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = strokes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StrokeRow {
    pub id: i64,
    pub item_id: i64,
    pub user_id: Option<i64>,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = strokes)]
pub(crate) struct NewStrokeRow<'a> {
    pub id: Option<i64>,
    pub item_id: i64,
    pub user_id: Option<i64>,
    pub username: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = billing_periods)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BillingPeriodRow {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = billing_periods)]
pub(crate) struct NewBillingPeriodRow<'a> {
    pub name: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
}

impl UserRow {
    pub(crate) fn into_account(self) -> Result<UserAccount, String> {
        let id = self.id;
        let username = Username::new(&self.username).map_err(|e| corrupt("users", id, e))?;
        let email = self
            .email
            .as_deref()
            .map(EmailAddress::new)
            .transpose()
            .map_err(|e| corrupt("users", id, e))?;
        let role: Role = self.role.parse().map_err(|e| corrupt("users", id, e))?;
        Ok(UserAccount {
            user: User {
                id: UserId::new(id),
                username,
                email,
                role,
                created_at: self.created_at,
            },
            password_digest: PasswordDigest::new(self.password_digest),
        })
    }

    pub(crate) fn into_user(self) -> Result<User, String> {
        self.into_account().map(|account| account.user)
    }
}

impl RoomRow {
    pub(crate) fn into_room(self) -> Result<Room, String> {
        let id = self.id;
        Ok(Room {
            id: RoomId::new(id),
            name: RoomName::new(&self.name).map_err(|e| corrupt("rooms", id, e))?,
            description: Description::new(Some(&self.description))
                .map_err(|e| corrupt("rooms", id, e))?,
            created_at: self.created_at,
            created_by: self.created_by.map(UserId::new),
        })
    }
}

impl ItemRow {
    pub(crate) fn into_item(self) -> Result<Item, String> {
        let id = self.id;
        Ok(Item {
            id: ItemId::new(id),
            name: ItemName::new(&self.name).map_err(|e| corrupt("items", id, e))?,
            description: Description::new(Some(&self.description))
                .map_err(|e| corrupt("items", id, e))?,
            room_id: RoomId::new(self.room_id),
            room_name: RoomName::new(&self.room_name).map_err(|e| corrupt("items", id, e))?,
            price: Price::from_cents(self.price_cents).map_err(|e| corrupt("items", id, e))?,
            created_at: self.created_at,
            created_by: self.created_by.map(UserId::new),
        })
    }
}

impl StrokeRow {
    pub(crate) fn into_stroke(self) -> Result<Stroke, String> {
        Ok(Stroke {
            id: StrokeId::new(self.id),
            item_id: ItemId::new(self.item_id),
            user_id: self.user_id.map(UserId::new),
            username: Username::new(&self.username).map_err(|e| corrupt("strokes", self.id, e))?,
            created_at: self.created_at,
        })
    }
}

impl BillingPeriodRow {
    pub(crate) fn into_period(self) -> Result<BillingPeriod, String> {
        let id = self.id;
        Ok(BillingPeriod {
            id: BillingPeriodId::new(id),
            name: PeriodName::new(&self.name).map_err(|e| corrupt("billing_periods", id, e))?,
            range: DateRange::new(self.start_date, self.end_date)
                .map_err(|e| corrupt("billing_periods", id, e))?,
            is_active: self.is_active,
            created_at: self.created_at,
            created_by: self.created_by.map(UserId::new),
        })
    }
}

/// Convert every row, failing on the first invalid one.
pub(crate) fn convert_all<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    rows.into_iter().map(convert).collect()
}
