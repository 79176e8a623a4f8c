//! Billing period handlers.
//!
//! ```text
//! POST /api/v1/billing-periods {"name":"March","startDate":"2024-03-01","endDate":"2024-03-31","activate":true}
//! PUT /api/v1/billing-periods/3/activate
//! GET /api/v1/billing-periods
//! GET /api/v1/billing-periods/active
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::BillingPeriodDraft;
use crate::domain::{BillingPeriodId, BillingPeriodValidationError, DateRange, Error, PeriodName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AdminCaller, Authenticated};
use crate::inbound::http::dto::BillingPeriodResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, ID, invalid_field, parse_date, parse_id};

const NAME: FieldName = FieldName::new("name");
const START_DATE: FieldName = FieldName::new("startDate");
const END_DATE: FieldName = FieldName::new("endDate");

/// Body for `POST /api/v1/billing-periods`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillingPeriodRequest {
    #[schema(example = "March 2024")]
    pub name: String,
    #[schema(example = "2024-03-01")]
    pub start_date: String,
    #[schema(example = "2024-03-31")]
    pub end_date: String,
    /// Activate immediately, deactivating any other period.
    #[serde(default)]
    pub activate: bool,
}

impl TryFrom<CreateBillingPeriodRequest> for BillingPeriodDraft {
    type Error = Error;

    fn try_from(value: CreateBillingPeriodRequest) -> Result<Self, Self::Error> {
        let name = PeriodName::new(&value.name).map_err(|err| invalid_field(NAME, err))?;
        let start = parse_date(&value.start_date, START_DATE)?;
        let end = parse_date(&value.end_date, END_DATE)?;
        let range = DateRange::new(start, end).map_err(|err| {
            let field = match err {
                BillingPeriodValidationError::InvertedRange
                | BillingPeriodValidationError::EndOutOfRange => END_DATE,
                _ => START_DATE,
            };
            invalid_field(field, err)
        })?;
        Ok(Self {
            name,
            range,
            activate: value.activate,
        })
    }
}

/// Create a billing period, inactive unless `activate` is set.
#[utoipa::path(
    post,
    path = "/api/v1/billing-periods",
    request_body = CreateBillingPeriodRequest,
    responses(
        (status = 201, description = "Period created", body = BillingPeriodResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema)
    ),
    tags = ["billing-periods"],
    operation_id = "createBillingPeriod"
)]
#[post("/billing-periods")]
pub async fn create_billing_period(
    state: web::Data<HttpState>,
    AdminCaller(caller): AdminCaller,
    payload: web::Json<CreateBillingPeriodRequest>,
) -> ApiResult<HttpResponse> {
    let draft = BillingPeriodDraft::try_from(payload.into_inner())?;
    let period = state.billing_periods.create(&caller, draft).await?;
    Ok(HttpResponse::Created().json(BillingPeriodResponse::from(period)))
}

/// Make a period the only active one.
#[utoipa::path(
    put,
    path = "/api/v1/billing-periods/{id}/activate",
    params(("id" = i64, Path, description = "Billing period id")),
    responses(
        (status = 200, description = "Activated period", body = BillingPeriodResponse),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 404, description = "Unknown period", body = ErrorSchema)
    ),
    tags = ["billing-periods"],
    operation_id = "activateBillingPeriod"
)]
#[put("/billing-periods/{id}/activate")]
pub async fn activate_billing_period(
    state: web::Data<HttpState>,
    _admin: AdminCaller,
    path: web::Path<String>,
) -> ApiResult<web::Json<BillingPeriodResponse>> {
    let id: BillingPeriodId = parse_id(&path.into_inner(), ID)?;
    let period = state.billing_periods.activate(id).await?;
    Ok(web::Json(period.into()))
}

/// Every billing period, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/billing-periods",
    responses(
        (status = 200, description = "Billing periods", body = [BillingPeriodResponse]),
        (status = 401, description = "Missing token", body = ErrorSchema)
    ),
    tags = ["billing-periods"],
    operation_id = "listBillingPeriods"
)]
#[get("/billing-periods")]
pub async fn list_billing_periods(
    state: web::Data<HttpState>,
    _caller: Authenticated,
) -> ApiResult<web::Json<Vec<BillingPeriodResponse>>> {
    let periods = state.billing_periods.list().await?;
    Ok(web::Json(periods.into_iter().map(Into::into).collect()))
}

/// Wrapper so "no active period" is an explicit `null` rather than 404.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBillingPeriodResponse {
    /// `None` when no period is active.
    pub billing_period: Option<BillingPeriodResponse>,
}

/// The active billing period, if any.
#[utoipa::path(
    get,
    path = "/api/v1/billing-periods/active",
    responses(
        (status = 200, description = "Active period or null", body = ActiveBillingPeriodResponse),
        (status = 401, description = "Missing token", body = ErrorSchema)
    ),
    tags = ["billing-periods"],
    operation_id = "getActiveBillingPeriod"
)]
#[get("/billing-periods/active")]
pub async fn active_billing_period(
    state: web::Data<HttpState>,
    _caller: Authenticated,
) -> ApiResult<web::Json<ActiveBillingPeriodResponse>> {
    let active = state.billing_periods.active().await?;
    Ok(web::Json(ActiveBillingPeriodResponse {
        billing_period: active.map(Into::into),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillingPeriod, UserId};
    use crate::inbound::http::test_utils::{MockPorts, admin, bearer, json_body, member, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn march(active: bool) -> BillingPeriod {
        BillingPeriod {
            id: BillingPeriodId::new(3),
            name: PeriodName::new("March").expect("valid name"),
            range: DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).expect("valid range"),
            is_active: active,
            created_at: Utc
                .with_ymd_and_hms(2024, 2, 28, 12, 0, 0)
                .single()
                .expect("valid instant"),
            created_by: Some(UserId::new(1)),
        }
    }

    #[actix_web::test]
    async fn create_with_activation_forwards_the_flag() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .billing_periods
            .expect_create()
            .withf(|_, draft| {
                draft.activate
                    && draft.range.start() == date(2024, 3, 1)
                    && draft.range.end() == date(2024, 3, 31)
            })
            .times(1)
            .returning(|_, _| Ok(march(true)));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/billing-periods"))
            .set_json(json!({
                "name": "March",
                "startDate": "2024-03-01",
                "endDate": "2024-03-31",
                "activate": true
            }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["isActive"], true);
        assert_eq!(body["startDate"], "2024-03-01");
    }

    #[rstest]
    #[case(json!({"name": "", "startDate": "2024-03-01", "endDate": "2024-03-31"}), "name")]
    #[case(json!({"name": "March", "startDate": "03/01/2024", "endDate": "2024-03-31"}), "startDate")]
    #[case(json!({"name": "March", "startDate": "2024-04-01", "endDate": "2024-03-31"}), "endDate")]
    #[actix_web::test]
    async fn create_validates_the_form(#[case] payload: Value, #[case] field: &str) {
        let mut ports = MockPorts::signed_in(&admin());
        ports.billing_periods.expect_create().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = bearer(actix_test::TestRequest::post().uri("/api/v1/billing-periods"))
            .set_json(payload)
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], field);
    }

    #[actix_web::test]
    async fn activating_an_unknown_period_is_not_found() {
        let mut ports = MockPorts::signed_in(&admin());
        ports
            .billing_periods
            .expect_activate()
            .returning(|_| Err(Error::not_found("billing period not found")));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::put().uri("/api/v1/billing-periods/42/activate"))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(march(true)))]
    #[actix_web::test]
    async fn members_read_the_active_period(#[case] active: Option<BillingPeriod>) {
        let expected_null = active.is_none();
        let mut ports = MockPorts::signed_in(&member());
        ports
            .billing_periods
            .expect_active()
            .returning(move || Ok(active.clone()));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let response = actix_test::call_service(
            &app,
            bearer(actix_test::TestRequest::get().uri("/api/v1/billing-periods/active"))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["billingPeriod"].is_null(), expected_null);
    }
}
