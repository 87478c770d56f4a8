use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, CheckoutSummary, Dashboard},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderWithItems},
    response::ApiResponse,
    routes::params::Pagination,
    services::{checkout_service, dashboard_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout_summary).post(place_order))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/dashboard", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/checkout",
    responses(
        (status = 200, description = "Pricing summary of the cart", body = ApiResponse<CheckoutSummary>),
        (status = 400, description = "Cart is empty")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutSummary>>> {
    let resp = checkout_service::checkout_summary(state.store.as_ref(), user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty"),
        (status = 409, description = "Insufficient stock"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = checkout_service::place_order(state.store.as_ref(), user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/orders",
    params(Pagination),
    responses(
        (status = 200, description = "Order history, newest first", body = ApiResponse<Vec<Order>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let resp = order_service::list_orders(state.store.as_ref(), user.user_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(state.store.as_ref(), user.user_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Recent orders and account counters", body = ApiResponse<Dashboard>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let resp = dashboard_service::dashboard(state.store.as_ref(), user.user_id).await?;
    Ok(Json(resp))
}
