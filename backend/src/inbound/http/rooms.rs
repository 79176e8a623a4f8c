//! Room handlers.
//!
//! ```text
//! GET /api/v1/rooms
//! POST /api/v1/rooms {"name":"Kitchen","description":"Ground floor"}
//! PUT /api/v1/rooms/2 {"name":"Pantry"}
//! DELETE /api/v1/rooms/2
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Description, Error, RoomChanges, RoomId, RoomName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminCaller, Authenticated};
use crate::inbound::http::dto::{RoomResponse, RoomSummaryResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, ID, invalid_field, parse_id};

pub(crate) const NAME: FieldName = FieldName::new("name");
pub(crate) const DESCRIPTION: FieldName = FieldName::new("description");

pub(crate) fn description(raw: Option<&str>) -> Result<Description, Error> {
    Description::new(raw).map_err(|err| invalid_field(DESCRIPTION, err))
}

/// Body for `POST /api/v1/rooms`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateRoomRequest {
    #[schema(example = "Kitchen")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for `PUT /api/v1/rooms/{id}`; omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<UpdateRoomRequest> for RoomChanges {
    type Error = Error;

    fn try_from(value: UpdateRoomRequest) -> Result<Self, Self::Error> {
        let name = value
            .name
            .map(RoomName::new)
            .transpose()
            .map_err(|err| invalid_field(NAME, err))?;
        let description = value
            .description
            .as_deref()
            .map(|raw| description(Some(raw)))
            .transpose()?;
        Ok(Self { name, description })
    }
}

/// Rooms ordered by name with their item counts.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    responses(
        (status = 200, description = "Rooms", body = [RoomSummaryResponse]),
        (status = 401, description = "Missing token", body = ErrorSchema),
        (status = 403, description = "Invalid token", body = ErrorSchema)
    ),
    tags = ["rooms"],
    operation_id = "listRooms"
)]
#[get("/rooms")]
pub async fn list_rooms(
    state: web::Data<HttpState>,
    _caller: Authenticated,
) -> ApiResult<web::Json<Vec<RoomSummaryResponse>>> {
    let rooms = state.catalogue.list_rooms().await?;
    Ok(web::Json(rooms.into_iter().map(Into::into).collect()))
}

/// Create a room. Names are unique regardless of case.
#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 409, description = "Name taken", body = ErrorSchema)
    ),
    tags = ["rooms"],
    operation_id = "createRoom"
)]
#[post("/rooms")]
pub async fn create_room(
    state: web::Data<HttpState>,
    AdminCaller(caller): AdminCaller,
    payload: web::Json<CreateRoomRequest>,
) -> ApiResult<HttpResponse> {
    let CreateRoomRequest {
        name: raw_name,
        description: raw_description,
    } = payload.into_inner();
    let name = RoomName::new(&raw_name).map_err(|err| invalid_field(NAME, err))?;
    let description = description(raw_description.as_deref())?;
    let room = state
        .catalogue
        .create_room(&caller, name, description)
        .await?;
    Ok(HttpResponse::Created().json(RoomResponse::from(room)))
}

/// Rename or re-describe a room. A rename also updates every item's copy of
/// the room name.
#[utoipa::path(
    put,
    path = "/api/v1/rooms/{id}",
    params(("id" = i64, Path, description = "Room id")),
    request_body = UpdateRoomRequest,
    responses(
        (status = 200, description = "Updated room", body = RoomResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown room", body = ErrorSchema),
        (status = 409, description = "Name taken", body = ErrorSchema)
    ),
    tags = ["rooms"],
    operation_id = "updateRoom"
)]
#[put("/rooms/{id}")]
pub async fn update_room(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
    payload: web::Json<UpdateRoomRequest>,
) -> ApiResult<web::Json<RoomResponse>> {
    let id: RoomId = parse_id(&path.into_inner(), ID)?;
    let changes = RoomChanges::try_from(payload.into_inner())?;
    let room = state.catalogue.update_room(id, changes).await?;
    Ok(web::Json(room.into()))
}

/// Delete an empty room. The default room is protected.
#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{id}",
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Default room", body = ErrorSchema),
        (status = 404, description = "Unknown room", body = ErrorSchema),
        (status = 409, description = "Room still holds items", body = ErrorSchema)
    ),
    tags = ["rooms"],
    operation_id = "deleteRoom"
)]
#[delete("/rooms/{id}")]
pub async fn delete_room(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: RoomId = parse_id(&path.into_inner(), ID)?;
    state.catalogue.delete_room(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Room, RoomSummary, UserId};
    use crate::inbound::http::test_utils::{MockPorts, admin, bearer, json_body, member, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    fn room(id: i64, name: &str) -> Room {
        Room {
            id: RoomId::new(id),
            name: RoomName::new(name).expect("valid name"),
            description: Description::default(),
            created_at: Utc
                .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
                .single()
                .expect("valid instant"),
            created_by: Some(UserId::new(1)),
        }
    }

    #[actix_web::test]
    async fn members_see_rooms_with_counts() {
        let mut ports = MockPorts::signed_in(&member());
        ports.catalogue.expect_list_rooms().returning(|| {
            Ok(vec![RoomSummary {
                room: room(1, "General"),
                item_count: 3,
            }])
        });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::get().uri("/api/v1/rooms")).to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["name"], "General");
        assert_eq!(body[0]["itemCount"], 3);
        assert_eq!(body[0]["createdBy"], 1);
    }

    #[actix_web::test]
    async fn members_cannot_create_rooms() {
        let mut ports = MockPorts::signed_in(&member());
        ports.catalogue.expect_create_room().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/rooms"))
            .set_json(json!({ "name": "Kitchen" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn create_room_trims_inputs() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_create_room()
            .withf(|_, name, description| {
                name.as_ref() == "Kitchen" && description.as_ref() == "Ground floor"
            })
            .times(1)
            .returning(|_, name, description| {
                let mut created = room(2, name.as_ref());
                created.description = description;
                Ok(created)
            });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/rooms"))
            .set_json(json!({ "name": "  Kitchen ", "description": " Ground floor " }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["description"], "Ground floor");
    }

    #[rstest]
    #[case(json!({ "name": "   " }))]
    #[case(json!({ "name": "x".repeat(101) }))]
    #[actix_web::test]
    async fn invalid_room_names_are_rejected(#[case] payload: serde_json::Value) {
        let mut ports = MockPorts::signed_in(&admin());
        ports.catalogue.expect_create_room().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/rooms"))
            .set_json(payload)
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], "name");
    }

    #[actix_web::test]
    async fn update_room_passes_only_supplied_fields() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_update_room()
            .withf(|id, changes| {
                *id == RoomId::new(2)
                    && changes
                        .name
                        .as_ref()
                        .is_some_and(|name| name.as_ref() == "Pantry")
                    && changes.description.is_none()
            })
            .times(1)
            .returning(|id, _| Ok(room(id.get(), "Pantry")));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::put().uri("/api/v1/rooms/2"))
            .set_json(json!({ "name": "Pantry" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(Ok(()), StatusCode::NO_CONTENT)]
    #[case(Err(Error::forbidden("the default room cannot be deleted")), StatusCode::FORBIDDEN)]
    #[case(Err(Error::conflict("room still contains 2 items")), StatusCode::CONFLICT)]
    #[case(Err(Error::not_found("room not found")), StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn delete_room_maps_service_outcomes(
        #[case] outcome: Result<(), Error>,
        #[case] expected: StatusCode,
    ) {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_delete_room()
            .times(1)
            .returning(move |_| outcome.clone());
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::delete().uri("/api/v1/rooms/3")).to_request(),
        )
        .await;

        assert_eq!(response.status(), expected);
    }
}
