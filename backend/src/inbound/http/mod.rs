//! HTTP inbound adapter exposing the REST API.
//!
//! Handlers translate JSON into validated domain values, call a driving
//! port from [`state::HttpState`] and render the result. Every failure is a
//! domain [`Error`](crate::domain::Error) rendered by [`error`].

pub mod admin;
pub mod auth;
pub mod billing_periods;
pub mod dto;
pub mod error;
pub mod health;
pub mod items;
pub mod rooms;
pub mod schemas;
pub mod state;
pub mod strokes;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::{error::JsonPayloadError, error::PathError, error::QueryPayloadError, web};

use crate::domain::Error;

pub use error::ApiResult;

/// Register every `/api/v1` handler. Mount inside the versioned scope.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use fixtrack::inbound::http::routes;
///
/// let app = App::new().service(web::scope("/api/v1").configure(routes));
/// ```
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(users::login)
        .service(users::register)
        .service(users::current_user)
        .service(users::change_own_password)
        .service(strokes::my_strokes)
        .service(admin::list_users)
        .service(admin::delete_user)
        .service(admin::reset_user_password)
        .service(admin::change_user_role)
        .service(admin::get_invitation_code)
        .service(admin::set_invitation_code)
        .service(rooms::list_rooms)
        .service(rooms::create_room)
        .service(rooms::update_room)
        .service(rooms::delete_room)
        .service(items::list_items)
        .service(items::create_item)
        .service(items::update_item)
        .service(items::delete_item)
        .service(strokes::add_stroke)
        .service(strokes::item_analytics)
        .service(strokes::reset_strokes)
        .service(billing_periods::active_billing_period)
        .service(billing_periods::list_billing_periods)
        .service(billing_periods::create_billing_period)
        .service(billing_periods::activate_billing_period);
}

/// JSON extractor settings: malformed bodies become `invalid_request`.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            JsonPayloadError::ContentType => "expected an application/json body".to_owned(),
            other => format!("invalid JSON body: {other}"),
        };
        Error::invalid_request(message).into()
    })
}

/// Query extractor settings: malformed query strings become `invalid_request`.
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}

/// Path extractor settings.
#[must_use]
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, _req| {
        Error::invalid_request(format!("invalid path: {err}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::test_utils::{MockPorts, json_body, test_app};
    use actix_web::http::StatusCode;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::test as actix_test;
    use rstest::rstest;

    #[rstest]
    #[case("{not json", "application/json")]
    #[case("{\"username\":\"a\"}", "application/json")]
    #[case("username=a", "text/plain")]
    #[actix_web::test]
    async fn malformed_bodies_are_invalid_requests(
        #[case] body: &'static str,
        #[case] content_type: &'static str,
    ) {
        let mut ports = MockPorts::default();
        ports.authentication.expect_login().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .insert_header((CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "invalid_request");
    }

    #[actix_web::test]
    async fn protected_routes_require_a_token() {
        let app = actix_test::init_service(test_app(MockPorts::default().into_state())).await;

        for (method, uri) in [
            ("GET", "/api/v1/me"),
            ("GET", "/api/v1/rooms"),
            ("GET", "/api/v1/users"),
            ("POST", "/api/v1/items/1/strokes"),
            ("GET", "/api/v1/billing-periods/active"),
        ] {
            let request = actix_test::TestRequest::default()
                .method(method.parse().expect("valid method"))
                .uri(uri)
                .to_request();
            let response = actix_test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }
}
