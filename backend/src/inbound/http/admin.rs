//! Administrator account management and the invitation code.
//!
//! ```text
//! GET /api/v1/users
//! DELETE /api/v1/users/7
//! PUT /api/v1/users/7/password {"newPassword":"changeme"}
//! PUT /api/v1/users/7/role {"role":"admin"}
//! PUT /api/v1/admin/invitation-code {"code":"spring-2024"}
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{InvitationCode, NewPassword, Role, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminCaller;
use crate::inbound::http::dto::{MessageResponse, UserResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, ID, invalid_field, parse_id};

const NEW_PASSWORD: FieldName = FieldName::new("newPassword");
const ROLE: FieldName = FieldName::new("role");
const CODE: FieldName = FieldName::new("code");

/// Every account, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Accounts", body = [UserResponse]),
        (status = 401, description = "Missing token", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let users = state.users.list_users().await?;
    Ok(web::Json(users.into_iter().map(Into::into).collect()))
}

/// Delete an account; its strokes stay with the username copy.
///
/// The bootstrap administrator, the caller's own account and the last
/// administrator cannot be deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 403, description = "Protected account", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema),
        (status = 409, description = "Last administrator", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    AdminCaller(caller): AdminCaller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: UserId = parse_id(&path.into_inner(), ID)?;
    state.users.delete_user(&caller, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Body for `PUT /api/v1/users/{id}/password`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Overwrite another account's password.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/password",
    params(("id" = i64, Path, description = "User id")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Weak password", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "resetUserPassword"
)]
#[put("/users/{id}/password")]
pub async fn reset_user_password(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id: UserId = parse_id(&path.into_inner(), ID)?;
    let password = NewPassword::new(&payload.new_password)
        .map_err(|err| invalid_field(NEW_PASSWORD, err))?;
    state.users.reset_password(id, &password).await?;
    Ok(web::Json(MessageResponse::new("password reset")))
}

/// Body for `PUT /api/v1/users/{id}/role`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangeRoleRequest {
    #[schema(example = "admin")]
    pub role: String,
}

/// Promote or demote an account.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    params(("id" = i64, Path, description = "User id")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Unknown role", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema),
        (status = 409, description = "Would leave no administrator", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "changeUserRole"
)]
#[put("/users/{id}/role")]
pub async fn change_user_role(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
    payload: web::Json<ChangeRoleRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let id: UserId = parse_id(&path.into_inner(), ID)?;
    let role: Role = payload
        .role
        .parse()
        .map_err(|err| invalid_field(ROLE, err))?;
    let user = state.users.change_role(id, role).await?;
    Ok(web::Json(user.into()))
}

/// Invitation code as shown to administrators.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct InvitationCodeBody {
    #[schema(example = "spring-2024")]
    pub code: String,
}

/// Current invitation code.
#[utoipa::path(
    get,
    path = "/api/v1/admin/invitation-code",
    responses(
        (status = 200, description = "Invitation code", body = InvitationCodeBody),
        (status = 403, description = "Not an administrator", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "getInvitationCode"
)]
#[get("/admin/invitation-code")]
pub async fn get_invitation_code(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
) -> ApiResult<web::Json<InvitationCodeBody>> {
    let code = state.users.invitation_code().await?;
    Ok(web::Json(InvitationCodeBody {
        code: code.as_str().to_owned(),
    }))
}

/// Replace the invitation code. Takes effect for the next registration.
#[utoipa::path(
    put,
    path = "/api/v1/admin/invitation-code",
    request_body = InvitationCodeBody,
    responses(
        (status = 200, description = "Stored code", body = InvitationCodeBody),
        (status = 400, description = "Code too short", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "setInvitationCode"
)]
#[put("/admin/invitation-code")]
pub async fn set_invitation_code(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    payload: web::Json<InvitationCodeBody>,
) -> ApiResult<web::Json<InvitationCodeBody>> {
    let code = InvitationCode::new(&payload.code).map_err(|err| invalid_field(CODE, err))?;
    state.users.set_invitation_code(&code).await?;
    Ok(web::Json(InvitationCodeBody {
        code: code.as_str().to_owned(),
    }))
}
