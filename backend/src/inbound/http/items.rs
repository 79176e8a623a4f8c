//! Item handlers.
//!
//! ```text
//! GET /api/v1/items?roomId=1&billingPeriodId=all
//! POST /api/v1/items {"name":"Cola","roomId":1,"price":1.5}
//! PUT /api/v1/items/5 {"roomId":2}
//! DELETE /api/v1/items/5
//! ```
//!
//! Listings are projected by the caller's stored role: administrators get
//! every field with stroke statistics, members get identity and room only.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::ItemDraft;
use crate::domain::{
    Error, ItemChanges, ItemId, ItemListing, ItemName, ItemWithStats, MemberItem, Price, RoomId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminCaller, Authenticated};
use crate::inbound::http::dto::ItemResponse;
use crate::inbound::http::rooms::description;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, ID, ROOM_ID, id_from_number, invalid_field, parse_id, parse_period_selector,
    parse_room_filter,
};

const NAME: FieldName = FieldName::new("name");
const PRICE: FieldName = FieldName::new("price");

fn item_name(raw: &str) -> Result<ItemName, Error> {
    ItemName::new(raw).map_err(|err| invalid_field(NAME, err))
}

fn price(raw: Decimal) -> Result<Price, Error> {
    Price::new(raw).map_err(|err| invalid_field(PRICE, err))
}

/// Query string for `GET /api/v1/items`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListQuery {
    pub room_id: Option<String>,
    pub billing_period_id: Option<String>,
}

/// Administrative listing entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminItemResponse {
    #[serde(flatten)]
    pub item: ItemResponse,
    #[schema(example = 12)]
    pub stroke_count: u64,
    pub last_stroke: Option<DateTime<Utc>>,
}

impl From<ItemWithStats> for AdminItemResponse {
    fn from(value: ItemWithStats) -> Self {
        Self {
            item: value.item.into(),
            stroke_count: value.stats.stroke_count,
            last_stroke: value.stats.last_stroke,
        }
    }
}

/// Member listing entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberItemResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub room_name: String,
}

impl From<MemberItem> for MemberItemResponse {
    fn from(value: MemberItem) -> Self {
        Self {
            id: value.id.get(),
            name: value.name.as_ref().to_owned(),
            description: value.description.as_ref().to_owned(),
            room_name: value.room_name.as_ref().to_owned(),
        }
    }
}

/// Items ordered by name, optionally filtered by room.
///
/// `billingPeriodId` scopes the administrative stroke statistics; an unknown
/// period id means no scoping.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(
        ("roomId" = Option<String>, Query, description = "Room id or `all`"),
        ("billingPeriodId" = Option<String>, Query, description = "Billing period id or `all`")
    ),
    responses(
        (status = 200, description = "Administrators receive AdminItemResponse entries; members receive MemberItemResponse entries", body = [AdminItemResponse]),
        (status = 400, description = "Malformed filter", body = ErrorSchema),
        (status = 401, description = "Missing token", body = ErrorSchema),
        (status = 403, description = "Invalid token", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "listItems"
)]
#[get("/items")]
pub async fn list_items(
    state: web::Data<HttpState>,
    Authenticated(caller): Authenticated,
    query: web::Query<ItemListQuery>,
) -> ApiResult<HttpResponse> {
    let ItemListQuery {
        room_id,
        billing_period_id,
    } = query.into_inner();
    let room = parse_room_filter(room_id.as_deref())?;
    let period = parse_period_selector(billing_period_id.as_deref())?;
    let listing = state.catalogue.list_items(&caller, room, period).await?;
    let response = match listing {
        ItemListing::Admin(items) => HttpResponse::Ok().json(
            items
                .into_iter()
                .map(AdminItemResponse::from)
                .collect::<Vec<_>>(),
        ),
        ItemListing::Member(items) => HttpResponse::Ok().json(
            items
                .into_iter()
                .map(MemberItemResponse::from)
                .collect::<Vec<_>>(),
        ),
    };
    Ok(response)
}

/// Body for `POST /api/v1/items`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[schema(example = "Cola")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(example = 1)]
    pub room_id: i64,
    /// Defaults to 0.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>, example = 1.5)]
    pub price: Option<Decimal>,
}

impl TryFrom<CreateItemRequest> for ItemDraft {
    type Error = Error;

    fn try_from(value: CreateItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: item_name(&value.name)?,
            description: description(value.description.as_deref())?,
            room_id: id_from_number(value.room_id, ROOM_ID)?,
            price: value.price.map(price).transpose()?.unwrap_or(Price::ZERO),
        })
    }
}

/// Body for `PUT /api/v1/items/{id}`; omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_id: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}

impl TryFrom<UpdateItemRequest> for ItemChanges {
    type Error = Error;

    fn try_from(value: UpdateItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.as_deref().map(item_name).transpose()?,
            description: value
                .description
                .as_deref()
                .map(|raw| description(Some(raw)))
                .transpose()?,
            room_id: value
                .room_id
                .map(|raw| id_from_number::<RoomId>(raw, ROOM_ID))
                .transpose()?,
            price: value.price.map(price).transpose()?,
        })
    }
}

/// Create an item in an existing room. Names are unique per room regardless
/// of case.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 404, description = "Unknown room", body = ErrorSchema),
        (status = 409, description = "Name taken in that room", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "createItem"
)]
#[post("/items")]
pub async fn create_item(
    state: web::Data<HttpState>,
    AdminCaller(caller): AdminCaller,
    payload: web::Json<CreateItemRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ItemDraft::try_from(payload.into_inner())?;
    let item = state.catalogue.create_item(&caller, draft).await?;
    Ok(HttpResponse::Created().json(ItemResponse::from(item)))
}

/// Edit or move an item.
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item", body = ItemResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown item or room", body = ErrorSchema),
        (status = 409, description = "Name taken in the target room", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "updateItem"
)]
#[put("/items/{id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
    payload: web::Json<UpdateItemRequest>,
) -> ApiResult<web::Json<ItemResponse>> {
    let id: ItemId = parse_id(&path.into_inner(), ID)?;
    let changes = ItemChanges::try_from(payload.into_inner())?;
    let item = state.catalogue.update_item(id, changes).await?;
    Ok(web::Json(item.into()))
}

/// Outcome of deleting an item.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedItemResponse {
    #[schema(example = 14)]
    pub removed_strokes: u64,
}

/// Delete an item together with its strokes.
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Deleted", body = DeletedItemResponse),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "deleteItem"
)]
#[delete("/items/{id}")]
pub async fn delete_item(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletedItemResponse>> {
    let id: ItemId = parse_id(&path.into_inner(), ID)?;
    let removed_strokes = state.catalogue.delete_item(id).await?;
    Ok(web::Json(DeletedItemResponse { removed_strokes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BillingPeriodId, Description, Item, ItemStats, PeriodSelector, RoomName, UserId,
    };
    use crate::inbound::http::test_utils::{MockPorts, admin, bearer, json_body, member, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn cola() -> Item {
        Item {
            id: ItemId::new(5),
            name: ItemName::new("Cola").expect("valid name"),
            description: Description::new(Some("0.5l")).expect("valid description"),
            room_id: RoomId::new(1),
            room_name: RoomName::new("Kitchen").expect("valid name"),
            price: Price::new(Decimal::new(150, 2)).expect("valid price"),
            created_at: Utc
                .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
                .single()
                .expect("valid instant"),
            created_by: Some(UserId::new(1)),
        }
    }

    #[actix_web::test]
    async fn admins_receive_statistics() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_list_items()
            .withf(|_, room, period| {
                *room == Some(RoomId::new(1))
                    && *period == PeriodSelector::Period(BillingPeriodId::new(3))
            })
            .returning(|_, _, _| {
                Ok(ItemListing::Admin(vec![ItemWithStats {
                    item: cola(),
                    stats: ItemStats {
                        stroke_count: 4,
                        last_stroke: None,
                    },
                }]))
            });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(
            actix_test::TestRequest::get().uri("/api/v1/items?roomId=1&billingPeriodId=3"),
        )
        .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["name"], "Cola");
        assert_eq!(body[0]["price"], 1.5);
        assert_eq!(body[0]["strokeCount"], 4);
        assert_eq!(body[0]["roomName"], "Kitchen");
    }

    #[actix_web::test]
    async fn members_receive_the_reduced_projection() {
        let mut ports = MockPorts::signed_in(&member());
        ports
            .catalogue
            .expect_list_items()
            .withf(|_, room, period| room.is_none() && *period == PeriodSelector::All)
            .returning(|_, _, _| Ok(ItemListing::Member(vec![MemberItem::from(cola())])));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::get().uri("/api/v1/items?roomId=all"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        let body = json_body(response).await;
        let entry = body[0].as_object().expect("object entry");
        let mut keys: Vec<_> = entry.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["description", "id", "name", "roomName"]);
    }

    #[rstest]
    #[case("/api/v1/items?roomId=kitchen", "roomId")]
    #[case("/api/v1/items?billingPeriodId=last", "billingPeriodId")]
    #[actix_web::test]
    async fn malformed_filters_are_rejected(#[case] uri: &str, #[case] field: &str) {
        let mut ports = MockPorts::signed_in(&member());
        ports.catalogue.expect_list_items().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response =
            actix_test::call_service(&app, bearer(actix_test::TestRequest::get().uri(uri)).to_request())
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], field);
    }

    #[actix_web::test]
    async fn create_item_defaults_the_price_to_zero() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_create_item()
            .withf(|_, draft| draft.price == Price::ZERO && draft.room_id == RoomId::new(1))
            .times(1)
            .returning(|_, _| Ok(cola()));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/items"))
            .set_json(json!({ "name": "Cola", "roomId": 1 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[rstest]
    #[case(json!({ "name": "Cola", "roomId": 1, "price": -0.5 }), "price")]
    #[case(json!({ "name": " ", "roomId": 1 }), "name")]
    #[case(json!({ "name": "Cola", "roomId": 0 }), "roomId")]
    #[actix_web::test]
    async fn create_item_validates_fields(#[case] payload: Value, #[case] field: &str) {
        let mut ports = MockPorts::signed_in(&admin());
        ports.catalogue.expect_create_item().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/items"))
            .set_json(payload)
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], field);
    }

    #[actix_web::test]
    async fn moving_an_item_sends_only_the_room() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_update_item()
            .withf(|id, changes| {
                *id == ItemId::new(5)
                    && changes.room_id == Some(RoomId::new(2))
                    && changes.name.is_none()
                    && changes.price.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(cola()));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::put().uri("/api/v1/items/5"))
            .set_json(json!({ "roomId": 2 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn delete_item_reports_removed_strokes() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .catalogue
            .expect_delete_item()
            .returning(|_| Ok(14));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::delete().uri("/api/v1/items/5")).to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["removedStrokes"], 14);
    }
}
