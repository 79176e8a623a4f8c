//! First-run data: the legacy JSON snapshot format and default seed values.
//!
//! The snapshot is the flat JSON document earlier deployments kept on disk.
//! It is parsed leniently (missing collections are empty, missing timestamps
//! fall back to the import time) and converted into validated entities
//! before anything touches the store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::catalogue::{CatalogueValidationError, Description, Item, ItemName, Price, Room, RoomName};
use super::ids::{DEFAULT_ROOM_ID, ItemId, RoomId, StrokeId, UserId};
use super::invitation::InvitationCode;
use super::ledger::Stroke;
use super::user::{EmailAddress, NewUser, Role, User, UserAccount, UserValidationError, Username};
use super::{NewRoom, PasswordDigest};

/// Errors raised while converting a snapshot into entities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacySnapshotError {
    #[error("snapshot is not valid JSON: {message}")]
    Malformed { message: String },
    #[error("user {id}: {source}")]
    User {
        id: i64,
        #[source]
        source: UserValidationError,
    },
    #[error("room {id}: {source}")]
    Room {
        id: i64,
        #[source]
        source: CatalogueValidationError,
    },
    #[error("item {id}: {source}")]
    Item {
        id: i64,
        #[source]
        source: CatalogueValidationError,
    },
    #[error("item {id} references unknown room {room_id}")]
    DanglingRoom { id: i64, room_id: i64 },
    #[error("stroke {id} references unknown item {item_id}")]
    DanglingItem { id: i64, item_id: i64 },
    #[error("stroke {id}: {source}")]
    Stroke {
        id: i64,
        #[source]
        source: UserValidationError,
    },
    /// Accounts are present but none of them is an administrator.
    #[error("snapshot holds accounts but no administrator")]
    NoAdmin,
    /// Rooms are present but none carries the default room id.
    #[error("snapshot holds rooms but none with id {expected}")]
    MissingDefaultRoom { expected: i64 },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument {
    #[serde(default)]
    users: Vec<SnapshotUser>,
    #[serde(default)]
    rooms: Vec<SnapshotRoom>,
    #[serde(default)]
    items: Vec<SnapshotItem>,
    #[serde(default)]
    strokes: Vec<SnapshotStroke>,
    #[serde(default)]
    invitation_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotUser {
    id: i64,
    username: String,
    password: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRoom {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_by: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotItem {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    room_id: i64,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    price: Option<Decimal>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_by: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotStroke {
    id: i64,
    item_id: i64,
    #[serde(default)]
    user_id: Option<i64>,
    username: String,
    #[serde(default, alias = "timestamp")]
    created_at: Option<DateTime<Utc>>,
}

/// Validated contents of a legacy snapshot, ids preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyImport {
    pub users: Vec<UserAccount>,
    pub rooms: Vec<Room>,
    pub items: Vec<Item>,
    pub strokes: Vec<Stroke>,
    pub invitation_code: Option<InvitationCode>,
}

impl LegacyImport {
    /// Parse and validate a snapshot document. `imported_at` stands in for
    /// missing timestamps.
    pub fn from_json(raw: &str, imported_at: DateTime<Utc>) -> Result<Self, LegacySnapshotError> {
        let document: SnapshotDocument =
            serde_json::from_str(raw).map_err(|err| LegacySnapshotError::Malformed {
                message: err.to_string(),
            })?;
        Self::from_document(document, imported_at)
    }

    fn from_document(
        document: SnapshotDocument,
        imported_at: DateTime<Utc>,
    ) -> Result<Self, LegacySnapshotError> {
        let users = document
            .users
            .into_iter()
            .map(|user| convert_user(user, imported_at))
            .collect::<Result<Vec<_>, _>>()?;
        if !users.is_empty() && !users.iter().any(|account| account.user.role.is_admin()) {
            return Err(LegacySnapshotError::NoAdmin);
        }
        let known_users: HashSet<UserId> = users.iter().map(|account| account.user.id).collect();
        let mut rooms = document
            .rooms
            .into_iter()
            .map(|room| convert_room(room, imported_at))
            .collect::<Result<Vec<_>, _>>()?;
        if !rooms.is_empty() && !rooms.iter().any(|room| room.id == DEFAULT_ROOM_ID) {
            return Err(LegacySnapshotError::MissingDefaultRoom {
                expected: DEFAULT_ROOM_ID.get(),
            });
        }
        for room in &mut rooms {
            room.created_by = room.created_by.filter(|id| known_users.contains(id));
        }
        let mut items = document
            .items
            .into_iter()
            .map(|item| convert_item(item, &rooms, imported_at))
            .collect::<Result<Vec<_>, _>>()?;
        for item in &mut items {
            item.created_by = item.created_by.filter(|id| known_users.contains(id));
        }
        let strokes = document
            .strokes
            .into_iter()
            .map(|stroke| convert_stroke(stroke, &items, &users, imported_at))
            .collect::<Result<Vec<_>, _>>()?;
        let invitation_code = document
            .invitation_code
            .map(|code| code.trim().to_owned())
            .filter(|code| !code.is_empty())
            .map(InvitationCode::from_stored);

        Ok(Self {
            users,
            rooms,
            items,
            strokes,
            invitation_code,
        })
    }

    /// Whether the snapshot holds nothing worth importing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.rooms.is_empty()
            && self.items.is_empty()
            && self.strokes.is_empty()
            && self.invitation_code.is_none()
    }
}

fn convert_user(
    user: SnapshotUser,
    imported_at: DateTime<Utc>,
) -> Result<UserAccount, LegacySnapshotError> {
    let wrap = |source| LegacySnapshotError::User {
        id: user.id,
        source,
    };
    let username = Username::new(&user.username).map_err(wrap)?;
    let email = user
        .email
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(EmailAddress::new)
        .transpose()
        .map_err(wrap)?;
    let role = user
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(wrap)?
        .unwrap_or(Role::User);
    Ok(UserAccount {
        user: User {
            id: UserId::new(user.id),
            username,
            email,
            role,
            created_at: user.created_at.unwrap_or(imported_at),
        },
        password_digest: PasswordDigest::new(user.password),
    })
}

fn convert_room(room: SnapshotRoom, imported_at: DateTime<Utc>) -> Result<Room, LegacySnapshotError> {
    let wrap = |source| LegacySnapshotError::Room {
        id: room.id,
        source,
    };
    Ok(Room {
        id: RoomId::new(room.id),
        name: RoomName::new(&room.name).map_err(wrap)?,
        description: Description::new(room.description.as_deref()).map_err(wrap)?,
        created_at: room.created_at.unwrap_or(imported_at),
        created_by: room.created_by.map(UserId::new),
    })
}

fn convert_item(
    item: SnapshotItem,
    rooms: &[Room],
    imported_at: DateTime<Utc>,
) -> Result<Item, LegacySnapshotError> {
    let wrap = |source| LegacySnapshotError::Item {
        id: item.id,
        source,
    };
    let room = rooms
        .iter()
        .find(|room| room.id.get() == item.room_id)
        .ok_or(LegacySnapshotError::DanglingRoom {
            id: item.id,
            room_id: item.room_id,
        })?;
    let price = item
        .price
        .map(Price::new)
        .transpose()
        .map_err(wrap)?
        .unwrap_or(Price::ZERO);
    Ok(Item {
        id: ItemId::new(item.id),
        name: ItemName::new(&item.name).map_err(wrap)?,
        description: Description::new(item.description.as_deref()).map_err(wrap)?,
        room_id: room.id,
        room_name: room.name.clone(),
        price,
        created_at: item.created_at.unwrap_or(imported_at),
        created_by: item.created_by.map(UserId::new),
    })
}

fn convert_stroke(
    stroke: SnapshotStroke,
    items: &[Item],
    users: &[UserAccount],
    imported_at: DateTime<Utc>,
) -> Result<Stroke, LegacySnapshotError> {
    if !items.iter().any(|item| item.id.get() == stroke.item_id) {
        return Err(LegacySnapshotError::DanglingItem {
            id: stroke.id,
            item_id: stroke.item_id,
        });
    }
    let user_id = stroke
        .user_id
        .filter(|id| users.iter().any(|account| account.user.id.get() == *id))
        .map(UserId::new);
    Ok(Stroke {
        id: StrokeId::new(stroke.id),
        item_id: ItemId::new(stroke.item_id),
        user_id,
        username: Username::new(&stroke.username).map_err(|source| {
            LegacySnapshotError::Stroke {
                id: stroke.id,
                source,
            }
        })?,
        created_at: stroke.created_at.unwrap_or(imported_at),
    })
}

/// Outcome of a legacy import attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Rows were written.
    Imported {
        users: usize,
        rooms: usize,
        items: usize,
        strokes: usize,
    },
    /// The store already held accounts; nothing was written.
    SkippedExistingData,
}

/// Defaults ensured on every start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSeed {
    /// Administrator created with id 1 when no accounts exist. `None` when no
    /// bootstrap password is configured.
    pub admin: Option<NewUser>,
    /// Room created with id 1 when it is missing.
    pub room: NewRoom,
    /// Invitation code stored when none exists.
    pub invitation_code: InvitationCode,
}

/// What seeding did to one kind of default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStatus {
    /// The default was written.
    Created,
    /// A value was already present.
    AlreadyPresent,
    /// Nothing was present and no default could be written.
    Missing,
}

/// Per-default seeding results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub admin: SeedStatus,
    pub room: SeedStatus,
    pub invitation_code: SeedStatus,
}
