//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::test::TestRequest;
use actix_web::{App, web};
use serde_json::Value;

use crate::domain::ports::{
    MockAccessControl, MockAuthentication, MockBillingPeriods, MockCatalogue, MockRegistration,
    MockStrokeLedger, MockUserAdministration,
};
use crate::domain::{Caller, Error, Role, UserId, Username};

use super::state::HttpState;

/// One mock per driving port; tests set expectations on the ports they
/// exercise and leave the rest untouched.
#[derive(Default)]
pub struct MockPorts {
    pub access: MockAccessControl,
    pub authentication: MockAuthentication,
    pub registration: MockRegistration,
    pub users: MockUserAdministration,
    pub catalogue: MockCatalogue,
    pub ledger: MockStrokeLedger,
    pub billing_periods: MockBillingPeriods,
}

impl MockPorts {
    /// Ports whose access control admits `caller` with their role.
    pub fn signed_in(caller: &Caller) -> Self {
        Self {
            access: access_for(caller),
            ..Self::default()
        }
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            access: Arc::new(self.access),
            authentication: Arc::new(self.authentication),
            registration: Arc::new(self.registration),
            users: Arc::new(self.users),
            catalogue: Arc::new(self.catalogue),
            ledger: Arc::new(self.ledger),
            billing_periods: Arc::new(self.billing_periods),
        }
    }
}

/// State whose access control is `access` and whose other ports expect no
/// calls.
pub fn state_with_access(access: MockAccessControl) -> HttpState {
    MockPorts {
        access,
        ..MockPorts::default()
    }
    .into_state()
}

/// Access control that resolves any token to `caller` and applies the admin
/// check against the caller's role.
pub fn access_for(caller: &Caller) -> MockAccessControl {
    let mut access = MockAccessControl::new();
    let member = caller.clone();
    access
        .expect_authenticate()
        .returning(move |_| Ok(member.clone()));
    let admin = caller.clone();
    access.expect_require_admin().returning(move |_| {
        if admin.role.is_admin() {
            Ok(admin.clone())
        } else {
            Err(Error::forbidden("admin role required"))
        }
    });
    access
}

pub fn caller(id: i64, username: &str, role: Role) -> Caller {
    Caller {
        user_id: UserId::new(id),
        username: Username::new(username).expect("valid username"),
        role,
    }
}

pub fn admin() -> Caller {
    caller(1, "admin", Role::Admin)
}

pub fn member() -> Caller {
    caller(2, "bob", Role::User)
}

/// Application exposing every API route under `/api/v1` over `state`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(super::json_config())
        .app_data(super::query_config())
        .app_data(super::path_config())
        .service(web::scope("/api/v1").configure(super::routes))
}

/// Attach a bearer token; the mocked access control ignores its value.
pub fn bearer(request: TestRequest) -> TestRequest {
    request.insert_header((AUTHORIZATION, "Bearer token"))
}

/// Read a response body as JSON.
pub async fn json_body(response: ServiceResponse) -> Value {
    let body = actix_web::test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}
