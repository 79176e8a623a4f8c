//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper returns an `invalid_request` domain error whose details name
//! the offending field and a machine-readable reason, e.g.
//! `{"field": "roomId", "code": "invalid_id", "value": "abc"}`.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::{Error, InvalidIdentifier, PeriodSelector, RoomId};

/// Validation reason codes reported in error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReasonCode {
    MissingField,
    InvalidId,
    InvalidDate,
    InvalidValue,
    InvalidSelector,
}

impl ReasonCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidId => "invalid_id",
            Self::InvalidDate => "invalid_date",
            Self::InvalidValue => "invalid_value",
            Self::InvalidSelector => "invalid_selector",
        }
    }
}

/// Wire name of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) const fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const ID: FieldName = FieldName::new("id");
pub(crate) const ROOM_ID: FieldName = FieldName::new("roomId");
pub(crate) const BILLING_PERIOD_ID: FieldName = FieldName::new("billingPeriodId");

fn field_error(field: FieldName, code: ReasonCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn field_value_error(
    field: FieldName,
    code: ReasonCode,
    message: impl Into<String>,
    value: &str,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
        "value": value,
    }))
}

/// A required field was absent or blank.
pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        ReasonCode::MissingField,
        format!("missing required field: {name}"),
    )
}

/// A field was present but failed domain validation.
pub(crate) fn invalid_field(field: FieldName, reason: impl Display) -> Error {
    field_error(field, ReasonCode::InvalidValue, reason.to_string())
}

/// Parse a positive integer identifier from a path or query segment.
pub(crate) fn parse_id<T>(raw: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = InvalidIdentifier>,
{
    raw.parse::<T>().map_err(|_| {
        let name = field.as_str();
        field_value_error(
            field,
            ReasonCode::InvalidId,
            format!("{name} must be a positive integer"),
            raw,
        )
    })
}

/// Validate a numeric identifier taken from a JSON body.
pub(crate) fn id_from_number<T>(raw: i64, field: FieldName) -> Result<T, Error>
where
    T: FromStr<Err = InvalidIdentifier>,
{
    parse_id(&raw.to_string(), field)
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub(crate) fn parse_date(raw: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        let name = field.as_str();
        field_value_error(
            field,
            ReasonCode::InvalidDate,
            format!("{name} must be a date in YYYY-MM-DD form"),
            raw,
        )
    })
}

/// Parse the optional `billingPeriodId` query parameter; absent or `all`
/// means no scoping.
pub(crate) fn parse_period_selector(raw: Option<&str>) -> Result<PeriodSelector, Error> {
    let Some(raw) = raw else {
        return Ok(PeriodSelector::All);
    };
    raw.parse::<PeriodSelector>().map_err(|_| {
        field_value_error(
            BILLING_PERIOD_ID,
            ReasonCode::InvalidSelector,
            "billingPeriodId must be 'all' or a period id",
            raw,
        )
    })
}

/// Parse the optional `roomId` query filter; absent, blank or `all` means
/// every room.
pub(crate) fn parse_room_filter(raw: Option<&str>) -> Result<Option<RoomId>, Error> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some(value) if value.is_empty() || value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => parse_id(value, ROOM_ID).map(Some),
    }
}
