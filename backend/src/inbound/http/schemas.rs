//! OpenAPI schema definitions for domain types.
//!
//! Domain types do not derive `ToSchema`. The wrappers here mirror their
//! serialized shape so the OpenAPI document can describe error payloads
//! without coupling the domain to utoipa.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No credentials were presented, or they were wrong.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The bearer token is malformed, forged or expired.
    #[schema(rename = "invalid_token")]
    InvalidToken,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A uniqueness rule was violated.
    #[schema(rename = "duplicate")]
    Duplicate,
    /// The request conflicts with the current state.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing service is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message.
    #[schema(example = "name must not be empty")]
    message: String,
    /// Request correlation identifier.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary structured details.
    details: Option<serde_json::Value>,
}
