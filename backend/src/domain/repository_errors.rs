//! Mapping from driven-port failures to transport-agnostic domain errors.
//!
//! Connection failures become `service_unavailable`, query failures become
//! redacted `internal_error`s, and each domain variant gets its stable code.

use serde_json::json;

use super::Error;
use super::ports::{
    BillingPeriodRepositoryError, BootstrapRepositoryError, CredentialHasherError,
    ItemRepositoryError, RoomRepositoryError, SessionTokenError, SettingsRepositoryError,
    StrokeRepositoryError, UserRepositoryError,
};

fn field_details(field: &str, code: &str) -> serde_json::Value {
    json!({ "field": field, "code": code })
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::NotFound => Error::not_found("user not found"),
        UserRepositoryError::DuplicateUsername => Error::duplicate("username already exists")
            .with_details(field_details("username", "duplicate_username")),
        UserRepositoryError::DuplicateEmail => Error::duplicate("email already exists")
            .with_details(field_details("email", "duplicate_email")),
        UserRepositoryError::LastAdmin => Error::conflict("at least one admin must remain")
            .with_details(json!({ "code": "last_admin" })),
    }
}

pub(crate) fn map_settings_error(error: SettingsRepositoryError) -> Error {
    match error {
        SettingsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("settings repository unavailable: {message}"))
        }
        SettingsRepositoryError::Query { message } => {
            Error::internal(format!("settings repository error: {message}"))
        }
    }
}

pub(crate) fn map_room_error(error: RoomRepositoryError) -> Error {
    match error {
        RoomRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("room repository unavailable: {message}"))
        }
        RoomRepositoryError::Query { message } => {
            Error::internal(format!("room repository error: {message}"))
        }
        RoomRepositoryError::NotFound => Error::not_found("room not found"),
        RoomRepositoryError::DuplicateName => {
            Error::duplicate("a room with this name already exists")
                .with_details(field_details("name", "duplicate_name"))
        }
        RoomRepositoryError::NotEmpty { item_count } => {
            Error::conflict(format!("room still contains {item_count} items"))
                .with_details(json!({ "code": "room_not_empty", "itemCount": item_count }))
        }
    }
}

pub(crate) fn map_item_error(error: ItemRepositoryError) -> Error {
    match error {
        ItemRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("item repository unavailable: {message}"))
        }
        ItemRepositoryError::Query { message } => {
            Error::internal(format!("item repository error: {message}"))
        }
        ItemRepositoryError::NotFound => Error::not_found("item not found"),
        ItemRepositoryError::RoomNotFound => {
            Error::not_found("room not found").with_details(field_details("roomId", "unknown_room"))
        }
        ItemRepositoryError::DuplicateName => {
            Error::duplicate("an item with this name already exists in the room")
                .with_details(field_details("name", "duplicate_name"))
        }
    }
}

pub(crate) fn map_stroke_error(error: StrokeRepositoryError) -> Error {
    match error {
        StrokeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("stroke repository unavailable: {message}"))
        }
        StrokeRepositoryError::Query { message } => {
            Error::internal(format!("stroke repository error: {message}"))
        }
        StrokeRepositoryError::ItemNotFound => Error::not_found("item not found"),
        StrokeRepositoryError::UserNotFound => Error::not_found("user not found"),
    }
}

pub(crate) fn map_billing_period_error(error: BillingPeriodRepositoryError) -> Error {
    match error {
        BillingPeriodRepositoryError::Connection { message } => Error::service_unavailable(
            format!("billing period repository unavailable: {message}"),
        ),
        BillingPeriodRepositoryError::Query { message } => {
            Error::internal(format!("billing period repository error: {message}"))
        }
        BillingPeriodRepositoryError::NotFound => Error::not_found("billing period not found"),
    }
}

pub(crate) fn map_bootstrap_error(error: BootstrapRepositoryError) -> Error {
    match error {
        BootstrapRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("bootstrap repository unavailable: {message}"))
        }
        BootstrapRepositoryError::Query { message } => {
            Error::internal(format!("bootstrap repository error: {message}"))
        }
    }
}

pub(crate) fn map_hasher_error(error: CredentialHasherError) -> Error {
    Error::internal(error.to_string())
}

pub(crate) fn map_token_error(error: SessionTokenError) -> Error {
    match error {
        SessionTokenError::Signing { message } => {
            Error::internal(format!("failed to issue session token: {message}"))
        }
        SessionTokenError::Invalid { .. } => Error::invalid_token("invalid session token"),
        SessionTokenError::Expired => Error::invalid_token("session token expired"),
    }
}
