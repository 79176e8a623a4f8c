//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every handler annotated with `#[utoipa::path]`, the
//! request and response bodies they reference, and the wire schemas for the
//! domain error. The bearer scheme applies globally; public endpoints opt out
//! with `security([])`.
//!
//! The document is served by Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// Registers the bearer token scheme issued by `POST /api/v1/login`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Session token issued by POST /api/v1/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "FixTrack API",
        description = "Shared-space consumption tracking: rooms, items, strokes and billing periods."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::register,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::change_own_password,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::delete_user,
        crate::inbound::http::admin::reset_user_password,
        crate::inbound::http::admin::change_user_role,
        crate::inbound::http::admin::get_invitation_code,
        crate::inbound::http::admin::set_invitation_code,
        crate::inbound::http::rooms::list_rooms,
        crate::inbound::http::rooms::create_room,
        crate::inbound::http::rooms::update_room,
        crate::inbound::http::rooms::delete_room,
        crate::inbound::http::items::list_items,
        crate::inbound::http::items::create_item,
        crate::inbound::http::items::update_item,
        crate::inbound::http::items::delete_item,
        crate::inbound::http::strokes::add_stroke,
        crate::inbound::http::strokes::item_analytics,
        crate::inbound::http::strokes::reset_strokes,
        crate::inbound::http::strokes::my_strokes,
        crate::inbound::http::billing_periods::create_billing_period,
        crate::inbound::http::billing_periods::activate_billing_period,
        crate::inbound::http::billing_periods::list_billing_periods,
        crate::inbound::http::billing_periods::active_billing_period,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        crate::inbound::http::items::MemberItemResponse,
    )),
    tags(
        (name = "session", description = "Login, registration and self-service"),
        (name = "users", description = "Account administration"),
        (name = "admin", description = "Invitation code management"),
        (name = "rooms", description = "Rooms"),
        (name = "items", description = "Items and their listing"),
        (name = "strokes", description = "Consumption logging and analytics"),
        (name = "billing-periods", description = "Billing windows"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn object_fields(schema: &RefOr<Schema>) -> Vec<String> {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            other => panic!("expected object schema, got {other:?}"),
        }
    }

    #[test]
    fn error_schema_uses_wire_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let fields = object_fields(schemas.get("Error").expect("Error schema"));

        for field in ["code", "message", "traceId", "details"] {
            assert!(fields.iter().any(|f| f == field), "missing {field}");
        }
    }

    #[rstest]
    #[case("/api/v1/login")]
    #[case("/api/v1/register")]
    #[case("/api/v1/me/strokes")]
    #[case("/api/v1/users/{id}/role")]
    #[case("/api/v1/admin/invitation-code")]
    #[case("/api/v1/rooms/{id}")]
    #[case("/api/v1/items/{id}/reset-strokes")]
    #[case("/api/v1/billing-periods/{id}/activate")]
    #[case("/health/ready")]
    fn documents_every_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn public_routes_opt_out_of_bearer_auth() {
        let doc = ApiDoc::openapi();
        let login = doc
            .paths
            .paths
            .get("/api/v1/login")
            .and_then(|item| item.post.as_ref())
            .expect("login operation");
        let security = login.security.as_ref().expect("explicit security");
        assert!(
            serde_json::to_value(security)
                .expect("serialise security")
                .as_array()
                .is_some_and(|requirements| requirements
                    .iter()
                    .all(|r| r.as_object().is_some_and(serde_json::Map::is_empty)))
        );
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
