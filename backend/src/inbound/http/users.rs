//! Session and self-service account handlers.
//!
//! ```text
//! POST /api/v1/login {"username":"admin","password":"secret1"}
//! POST /api/v1/register {"username":"bob","password":"hunter22","invitationCode":"join-us"}
//! GET /api/v1/me
//! PUT /api/v1/me/password {"currentPassword":"hunter22","newPassword":"hunter23"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{LoginOutcome, RegistrationRequest};
use crate::domain::{
    EmailAddress, Error, LoginCredentials, LoginValidationError, NewPassword, Role, User,
    Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::dto::{MessageResponse, UserResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field};

const USERNAME: FieldName = FieldName::new("username");
const PASSWORD: FieldName = FieldName::new("password");
const EMAIL: FieldName = FieldName::new("email");
const NEW_PASSWORD: FieldName = FieldName::new("newPassword");

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "secret1")]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Identity embedded in the login response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "admin")]
    pub username: String,
    #[schema(value_type = String, example = "admin")]
    pub role: Role,
}

/// Issued session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let LoginOutcome {
            token,
            user,
            expires_at,
        } = outcome;
        Self {
            token: token.as_str().to_owned(),
            user: SessionUser {
                id: user.id.get(),
                username: user.username.into(),
                role: user.role,
            },
            expires_at,
        }
    }
}

/// Check credentials and issue a bearer token.
///
/// Unknown usernames and wrong passwords both yield 401 with the same
/// message.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let outcome = state.authentication.login(&credentials).await?;
    Ok(web::Json(outcome.into()))
}

/// Self-registration body for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "bob")]
    pub username: String,
    pub password: String,
    #[serde(default)]
    #[schema(example = "bob@example.org")]
    pub email: Option<String>,
    #[schema(example = "join-us")]
    pub invitation_code: String,
}

impl TryFrom<RegisterRequest> for RegistrationRequest {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let username = Username::new(&value.username).map_err(|err| invalid_field(USERNAME, err))?;
        let password = NewPassword::new(&value.password).map_err(|err| invalid_field(PASSWORD, err))?;
        let email = value
            .email
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(EmailAddress::new)
            .transpose()
            .map_err(|err| invalid_field(EMAIL, err))?;
        Ok(Self {
            username,
            password,
            email,
            invitation_code: value.invitation_code,
        })
    }
}

/// Create a regular account with the shared invitation code.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request or invitation code", body = ErrorSchema),
        (status = 409, description = "Username or email taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = RegistrationRequest::try_from(payload.into_inner())?;
    let user: User = state.registration.register(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// The caller's account as currently stored.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Missing token", body = ErrorSchema),
        (status = 403, description = "Invalid token", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "getSelf"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    Authenticated(caller): Authenticated,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.authentication.current_user(&caller).await?;
    Ok(web::Json(user.into()))
}

/// Password change body for `PUT /api/v1/me/password`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Replace the caller's password after confirming the current one.
///
/// Tokens issued before the change stay valid until they expire.
#[utoipa::path(
    put,
    path = "/api/v1/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or weak new one", body = ErrorSchema),
        (status = 401, description = "Missing token", body = ErrorSchema),
        (status = 403, description = "Invalid token", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "changeOwnPassword"
)]
#[put("/me/password")]
pub async fn change_own_password(
    state: web::Data<HttpState>,
    Authenticated(caller): Authenticated,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let ChangePasswordRequest {
        current_password,
        new_password,
    } = payload.into_inner();
    let replacement =
        NewPassword::new(&new_password).map_err(|err| invalid_field(NEW_PASSWORD, err))?;
    state
        .authentication
        .change_password(&caller, &current_password, &replacement)
        .await?;
    Ok(web::Json(MessageResponse::new("password updated")))
}
