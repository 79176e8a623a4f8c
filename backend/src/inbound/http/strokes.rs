//! Stroke logging, analytics and the caller's own tally.
//!
//! ```text
//! POST /api/v1/items/5/strokes
//! GET /api/v1/items/5/analytics?billingPeriodId=3
//! POST /api/v1/items/5/reset-strokes?billingPeriodId=all
//! GET /api/v1/me/strokes
//! ```

use std::collections::BTreeMap;

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CostLine, ItemAnalytics, ItemId, Stroke, StrokeReceipt, UserStrokeBreakdown,
    UserStrokeSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminCaller, Authenticated};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{ID, parse_id, parse_period_selector};

/// Optional `billingPeriodId` query parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    pub billing_period_id: Option<String>,
}

/// Confirmation of a logged stroke.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StrokeReceiptResponse {
    pub id: i64,
    #[schema(example = "Cola")]
    pub item_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<StrokeReceipt> for StrokeReceiptResponse {
    fn from(value: StrokeReceipt) -> Self {
        Self {
            id: value.id.get(),
            item_name: value.item_name.as_ref().to_owned(),
            created_at: value.created_at,
        }
    }
}

/// Log one stroke by the caller against an item.
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/strokes",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 201, description = "Stroke recorded", body = StrokeReceiptResponse),
        (status = 401, description = "Missing token", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["strokes"],
    operation_id = "addStroke"
)]
#[post("/items/{id}/strokes")]
pub async fn add_stroke(
    state: web::Data<HttpState>,
    Authenticated(caller): Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ItemId = parse_id(&path.into_inner(), ID)?;
    let receipt = state.ledger.add_stroke(&caller, id).await?;
    Ok(HttpResponse::Created().json(StrokeReceiptResponse::from(receipt)))
}

/// Item identity in an analytics report.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsItemResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// One user's share of an item's strokes.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStrokesResponse {
    pub username: String,
    pub count: u64,
    pub last_stroke: DateTime<Utc>,
}

impl From<UserStrokeBreakdown> for UserStrokesResponse {
    fn from(value: UserStrokeBreakdown) -> Self {
        Self {
            username: value.username.into(),
            count: value.count,
            last_stroke: value.last_stroke,
        }
    }
}

/// A recent stroke.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentStrokeResponse {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Stroke> for RecentStrokeResponse {
    fn from(value: Stroke) -> Self {
        Self {
            id: value.id.get(),
            username: value.username.into(),
            created_at: value.created_at,
        }
    }
}

/// Stroke analytics for one item.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemAnalyticsResponse {
    pub item: AnalyticsItemResponse,
    pub total_strokes: u64,
    pub strokes_by_user: Vec<UserStrokesResponse>,
    /// Most recent first, at most ten.
    pub recent_strokes: Vec<RecentStrokeResponse>,
}

impl From<ItemAnalytics> for ItemAnalyticsResponse {
    fn from(value: ItemAnalytics) -> Self {
        Self {
            item: AnalyticsItemResponse {
                id: value.item.id.get(),
                name: value.item.name.as_ref().to_owned(),
                description: value.item.description.as_ref().to_owned(),
            },
            total_strokes: value.total_strokes,
            strokes_by_user: value.by_user.into_iter().map(Into::into).collect(),
            recent_strokes: value.recent.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-user and recent stroke figures for one item.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/analytics",
    params(
        ("id" = i64, Path, description = "Item id"),
        ("billingPeriodId" = Option<String>, Query, description = "Billing period id or `all`")
    ),
    responses(
        (status = 200, description = "Analytics", body = ItemAnalyticsResponse),
        (status = 400, description = "Malformed id or period", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["strokes"],
    operation_id = "getItemAnalytics"
)]
#[get("/items/{id}/analytics")]
pub async fn item_analytics(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<web::Json<ItemAnalyticsResponse>> {
    let id: ItemId = parse_id(&path.into_inner(), ID)?;
    let period = parse_period_selector(query.billing_period_id.as_deref())?;
    let analytics = state.ledger.item_analytics(id, period).await?;
    Ok(web::Json(analytics.into()))
}

/// Number of strokes removed by a reset.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetStrokesResponse {
    pub removed_count: u64,
}

/// Delete an item's strokes inside the period. Irreversible.
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/reset-strokes",
    params(
        ("id" = i64, Path, description = "Item id"),
        ("billingPeriodId" = Option<String>, Query, description = "Billing period id or `all`")
    ),
    responses(
        (status = 200, description = "Strokes removed", body = ResetStrokesResponse),
        (status = 400, description = "Malformed id or period", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["strokes"],
    operation_id = "resetStrokes"
)]
#[post("/items/{id}/reset-strokes")]
pub async fn reset_strokes(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<web::Json<ResetStrokesResponse>> {
    let id: ItemId = parse_id(&path.into_inner(), ID)?;
    let period = parse_period_selector(query.billing_period_id.as_deref())?;
    let removed_count = state.ledger.reset_strokes(id, period).await?;
    Ok(web::Json(ResetStrokesResponse { removed_count }))
}

/// One priced line of the caller's tally.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostLineResponse {
    pub item_id: i64,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 1.5)]
    pub unit_price: Decimal,
    pub count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 4.5)]
    pub subtotal: Decimal,
}

impl From<CostLine> for CostLineResponse {
    fn from(value: CostLine) -> Self {
        Self {
            item_id: value.item_id.get(),
            item_name: value.item_name.as_ref().to_owned(),
            unit_price: value.unit_price.amount(),
            count: value.count,
            subtotal: value.subtotal,
        }
    }
}

/// The caller's stroke counts keyed by item id, with the priced breakdown.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserStrokeSummaryResponse {
    pub counts: BTreeMap<i64, u64>,
    pub lines: Vec<CostLineResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 4.5)]
    pub total: Decimal,
}

impl From<UserStrokeSummary> for UserStrokeSummaryResponse {
    fn from(value: UserStrokeSummary) -> Self {
        Self {
            counts: value
                .counts
                .into_iter()
                .map(|(id, count)| (id.get(), count))
                .collect(),
            lines: value.lines.into_iter().map(Into::into).collect(),
            total: value.total,
        }
    }
}

/// The caller's own counts per item with the priced total.
#[utoipa::path(
    get,
    path = "/api/v1/me/strokes",
    params(
        ("billingPeriodId" = Option<String>, Query, description = "Billing period id or `all`")
    ),
    responses(
        (status = 200, description = "Stroke tally", body = UserStrokeSummaryResponse),
        (status = 400, description = "Malformed period", body = ErrorSchema),
        (status = 401, description = "Missing token", body = ErrorSchema)
    ),
    tags = ["strokes"],
    operation_id = "getUserStrokeCounts"
)]
#[get("/me/strokes")]
pub async fn my_strokes(
    state: web::Data<HttpState>,
    Authenticated(caller): Authenticated,
    query: web::Query<PeriodQuery>,
) -> ApiResult<web::Json<UserStrokeSummaryResponse>> {
    let period = parse_period_selector(query.billing_period_id.as_deref())?;
    let summary = state.ledger.user_summary(&caller, period).await?;
    Ok(web::Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AnalyticsItem, BillingPeriodId, Description, Error, ItemName, PeriodSelector, Price,
        StrokeId, UserId, Username,
    };
    use crate::inbound::http::test_utils::{MockPorts, admin, bearer, json_body, member, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 18, minute, 0)
            .single()
            .expect("valid instant")
    }

    fn cola_name() -> ItemName {
        ItemName::new("Cola").expect("valid name")
    }

    #[actix_web::test]
    async fn members_log_strokes() {
        let mut ports = MockPorts::signed_in(&member());
        ports
            .ledger
            .expect_add_stroke()
            .withf(|caller, item| caller.username.as_ref() == "bob" && *item == ItemId::new(5))
            .times(1)
            .returning(|_, _| {
                Ok(StrokeReceipt {
                    id: StrokeId::new(40),
                    item_name: cola_name(),
                    created_at: at(5),
                })
            });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::post().uri("/api/v1/items/5/strokes")).to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["id"], 40);
        assert_eq!(body["itemName"], "Cola");
    }

    #[actix_web::test]
    async fn strokes_on_unknown_items_are_not_found() {
        let mut ports = MockPorts::signed_in(&member());
        ports
            .ledger
            .expect_add_stroke()
            .returning(|_, _| Err(Error::not_found("item not found")));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::post().uri("/api/v1/items/99/strokes")).to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn analytics_are_admin_only() {
        let mut ports = MockPorts::signed_in(&member());
        ports.ledger.expect_item_analytics().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::get().uri("/api/v1/items/5/analytics")).to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn analytics_render_the_breakdown() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .ledger
            .expect_item_analytics()
            .withf(|_, period| *period == PeriodSelector::Period(BillingPeriodId::new(2)))
            .returning(|id, _| {
                let bob = Username::new("bob").expect("valid username");
                Ok(ItemAnalytics {
                    item: AnalyticsItem {
                        id,
                        name: cola_name(),
                        description: Description::default(),
                    },
                    total_strokes: 2,
                    by_user: vec![UserStrokeBreakdown {
                        username: bob.clone(),
                        count: 2,
                        last_stroke: at(9),
                    }],
                    recent: vec![Stroke {
                        id: StrokeId::new(2),
                        item_id: id,
                        user_id: Some(UserId::new(2)),
                        username: bob,
                        created_at: at(9),
                    }],
                })
            });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(
            actix_test::TestRequest::get().uri("/api/v1/items/5/analytics?billingPeriodId=2"),
        )
        .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["item"]["id"], 5);
        assert_eq!(body["totalStrokes"], 2);
        assert_eq!(body["strokesByUser"][0]["username"], "bob");
        assert_eq!(body["recentStrokes"][0]["id"], 2);
    }

    #[rstest]
    #[case("/api/v1/items/5/reset-strokes", PeriodSelector::All)]
    #[case(
        "/api/v1/items/5/reset-strokes?billingPeriodId=7",
        PeriodSelector::Period(BillingPeriodId::new(7))
    )]
    #[actix_web::test]
    async fn reset_passes_the_period_through(
        #[case] uri: &str,
        #[case] expected: PeriodSelector,
    ) {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .ledger
            .expect_reset_strokes()
            .withf(move |_, period| *period == expected)
            .times(1)
            .returning(|_, _| Ok(3));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response =
            actix_test::call_service(&app, bearer(actix_test::TestRequest::post().uri(uri)).to_request())
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["removedCount"], 3);
    }

    #[actix_web::test]
    async fn own_tally_is_priced() {
        let mut ports = MockPorts::signed_in(&member());
        ports.ledger.expect_user_summary().returning(|_, _| {
            let price = Price::new(Decimal::new(150, 2)).expect("valid price");
            let mut counts = BTreeMap::new();
            counts.insert(ItemId::new(5), 3);
            Ok(UserStrokeSummary {
                counts,
                lines: vec![CostLine {
                    item_id: ItemId::new(5),
                    item_name: cola_name(),
                    unit_price: price,
                    count: 3,
                    subtotal: price.times(3).expect("in range"),
                }],
                total: price.times(3).expect("in range"),
            })
        });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::get().uri("/api/v1/me/strokes")).to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["counts"]["5"], 3);
        assert_eq!(body["total"], 4.5);
        assert_eq!(body["lines"][0]["unitPrice"], 1.5);
    }
}
