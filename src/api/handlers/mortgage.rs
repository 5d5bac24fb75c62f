//! Mortgage calculator, rate and application handlers.

use axum::{
    Extension, Json, middleware,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::{APPLICATION_TAG, CALCULATOR_TAG, RATE_TAG};
use crate::api::dto::{
    ApplicationListQuery, ApplicationResponse, ApplyRequest, CalculateRequest, CalculateResponse,
    CompareRatesRequest, ErrorResponse, PagedResponse, RateComparisonResponse, RateQuery,
    RateResponse,
};
use crate::api::middleware::{AuthUser, auth_middleware};
use crate::error::AppResult;
use crate::services::mortgage::ApplicationQuery;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Creates mortgage routes.
///
/// Public:
/// - POST /calculate
/// - GET /rates
/// - GET /rates/bank/{bank_id}
/// - POST /rates/compare
///
/// Bearer token required:
/// - POST /apply
/// - GET /applications
/// - GET /applications/{id}
/// - POST /applications/{id}/withdraw
pub fn mortgage_routes(state: AppState) -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(routes!(calculate))
        .routes(routes!(list_rates))
        .routes(routes!(bank_rates))
        .routes(routes!(compare_rates));

    let protected = OpenApiRouter::new()
        .routes(routes!(apply))
        .routes(routes!(list_applications))
        .routes(routes!(get_application))
        .routes(routes!(withdraw_application))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// POST /api/mortgage/calculate - Monthly payment and schedule preview
#[utoipa::path(
    post,
    path = "/calculate",
    tag = CALCULATOR_TAG,
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Payment breakdown", body = CalculateResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
async fn calculate(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CalculateRequest>,
) -> AppResult<Json<CalculateResponse>> {
    let quote = state.services.mortgage.calculate(payload.into())?;
    Ok(Json(CalculateResponse::from(quote)))
}

/// GET /api/mortgage/rates - Currently effective rates, lowest first
#[utoipa::path(
    get,
    path = "/rates",
    tag = RATE_TAG,
    params(RateQuery),
    responses(
        (status = 200, description = "Effective rates", body = Vec<RateResponse>)
    )
)]
async fn list_rates(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<RateQuery>,
) -> AppResult<Json<Vec<RateResponse>>> {
    let rates = state.services.mortgage.list_rates(query.rate_type).await?;
    Ok(Json(rates.into_iter().map(RateResponse::from).collect()))
}

/// GET /api/mortgage/rates/bank/{bank_id} - All rates published by one bank
#[utoipa::path(
    get,
    path = "/rates/bank/{bank_id}",
    tag = RATE_TAG,
    params(
        ("bank_id" = i32, Path, description = "Bank ID")
    ),
    responses(
        (status = 200, description = "Bank rates", body = Vec<RateResponse>),
        (status = 404, description = "Bank not found", body = ErrorResponse)
    )
)]
async fn bank_rates(
    State(state): State<AppState>,
    Path(bank_id): Path<i32>,
) -> AppResult<Json<Vec<RateResponse>>> {
    let rates = state.services.mortgage.bank_rates(bank_id).await?;
    Ok(Json(rates.into_iter().map(RateResponse::from).collect()))
}

/// POST /api/mortgage/rates/compare - Cost of a loan under every effective rate
#[utoipa::path(
    post,
    path = "/rates/compare",
    tag = RATE_TAG,
    request_body = CompareRatesRequest,
    responses(
        (status = 200, description = "Offers ordered by interest rate", body = Vec<RateComparisonResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
async fn compare_rates(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CompareRatesRequest>,
) -> AppResult<Json<Vec<RateComparisonResponse>>> {
    let entries = state
        .services
        .mortgage
        .compare_rates(payload.loan_amount, payload.loan_period, payload.rate_type)
        .await?;
    Ok(Json(entries.into_iter().map(RateComparisonResponse::from).collect()))
}

/// POST /api/mortgage/apply - Submit an application
#[utoipa::path(
    post,
    path = "/apply",
    tag = APPLICATION_TAG,
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Bank not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn apply(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<ApplyRequest>,
) -> AppResult<(StatusCode, Json<ApplicationResponse>)> {
    let application = state
        .services
        .mortgage
        .apply(auth_user.user_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

/// GET /api/mortgage/applications - The caller's applications
#[utoipa::path(
    get,
    path = "/applications",
    tag = APPLICATION_TAG,
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "Paginated applications", body = PagedResponse<ApplicationResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn list_applications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ApplicationListQuery>,
) -> AppResult<Json<PagedResponse<ApplicationResponse>>> {
    let (applications, total) = state
        .services
        .mortgage
        .list_applications(auth_user.user_id, &ApplicationQuery::from(&query))
        .await?;

    let data = applications.into_iter().map(ApplicationResponse::from).collect();
    Ok(Json(PagedResponse::new(
        data,
        query.page,
        query.page_size,
        total.max(0) as u64,
    )))
}

/// GET /api/mortgage/applications/{id} - One of the caller's applications
#[utoipa::path(
    get,
    path = "/applications/{id}",
    tag = APPLICATION_TAG,
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application found", body = ApplicationResponse),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApplicationResponse>> {
    let application = state
        .services
        .mortgage
        .get_application(auth_user.user_id, id)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

/// POST /api/mortgage/applications/{id}/withdraw - Withdraw an open application
#[utoipa::path(
    post,
    path = "/applications/{id}/withdraw",
    tag = APPLICATION_TAG,
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application withdrawn", body = ApplicationResponse),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse),
        (status = 409, description = "Status changed concurrently", body = ErrorResponse),
        (status = 422, description = "Application can no longer be withdrawn", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn withdraw_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApplicationResponse>> {
    let application = state
        .services
        .mortgage
        .withdraw_application(auth_user.user_id, id)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}
