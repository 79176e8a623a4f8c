//! Bearer-token extractors used by HTTP handlers.
//!
//! Handlers declare the capability they need by taking [`Authenticated`] or
//! [`AdminCaller`] as an argument; public handlers take neither. Both
//! extractors defer to the [`AccessControl`](crate::domain::ports::AccessControl)
//! port held in [`HttpState`].

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Caller, Capability, Error, resolve_caller};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Token carried in `Authorization: Bearer <token>`, if any.
///
/// A header with another scheme or an empty token counts as absent.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let raw = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

fn caller_future(
    req: &HttpRequest,
    capability: Capability,
) -> LocalBoxFuture<'static, Result<Caller, Error>> {
    let state = req.app_data::<web::Data<HttpState>>().cloned();
    let token = bearer_token(req);
    Box::pin(async move {
        let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
        resolve_caller(state.access.as_ref(), token.as_deref(), capability)
            .await?
            .ok_or_else(|| Error::unauthorized("authentication required"))
    })
}

/// Any caller holding a valid session token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Caller);

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let fut = caller_future(req, Capability::AnyAuthenticated);
        Box::pin(async move { fut.await.map(Self) })
    }
}

/// A caller whose stored account currently holds the admin role.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub Caller);

impl FromRequest for AdminCaller {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let fut = caller_future(req, Capability::AdminOnly);
        Box::pin(async move { fut.await.map(Self) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAccessControl;
    use crate::domain::{Role, UserId, Username};
    use crate::inbound::http::test_utils::state_with_access;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    fn caller(role: Role) -> Caller {
        Caller {
            user_id: UserId::new(3),
            username: Username::new("dana").expect("valid username"),
            role,
        }
    }

    async fn call(access: MockAccessControl, path: &str, header: Option<&str>) -> StatusCode {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_access(access)))
                .route(
                    "/member",
                    web::get().to(|Authenticated(caller): Authenticated| async move {
                        HttpResponse::Ok().body(caller.username.as_ref().to_owned())
                    }),
                )
                .route(
                    "/admin",
                    web::get().to(|AdminCaller(_): AdminCaller| async { HttpResponse::Ok() }),
                ),
        )
        .await;
        let mut request = actix_test::TestRequest::get().uri(path);
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }
        actix_test::call_service(&app, request.to_request())
            .await
            .status()
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic abc"))]
    #[case(Some("Bearer   "))]
    #[actix_web::test]
    async fn missing_tokens_are_unauthorized(#[case] header: Option<&str>) {
        let mut access = MockAccessControl::new();
        access.expect_authenticate().never();
        assert_eq!(
            call(access, "/member", header).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_tokens_reach_the_handler() {
        let mut access = MockAccessControl::new();
        access
            .expect_authenticate()
            .withf(|token| token == "good")
            .times(1)
            .returning(|_| Ok(caller(Role::User)));
        assert_eq!(
            call(access, "/member", Some("Bearer good")).await,
            StatusCode::OK
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn rejected_tokens_are_forbidden() {
        let mut access = MockAccessControl::new();
        access
            .expect_authenticate()
            .returning(|_| Err(Error::invalid_token("invalid or expired token")));
        assert_eq!(
            call(access, "/member", Some("Bearer stale")).await,
            StatusCode::FORBIDDEN
        );
    }

    #[rstest]
    #[case(Ok(caller(Role::Admin)), StatusCode::OK)]
    #[case(Err(Error::forbidden("admin role required")), StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn admin_routes_use_the_admin_check(
        #[case] outcome: Result<Caller, Error>,
        #[case] expected: StatusCode,
    ) {
        let mut access = MockAccessControl::new();
        access.expect_authenticate().never();
        access
            .expect_require_admin()
            .times(1)
            .returning(move |_| outcome.clone());
        assert_eq!(call(access, "/admin", Some("Bearer t")).await, expected);
    }
}
