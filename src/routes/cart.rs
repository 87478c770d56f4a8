use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartItemQuantity, CartItemRequest, CartView, PromoRequest, UpdateCartRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ActionResponse, ApiResponse},
    routes::{action_body, action_reply},
    services::cart_service,
    state::AppState,
};

const ITEM_NOT_FOUND: &str = "Item not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/add_to_cart/{id}", get(add_to_cart))
        .route("/cart/update", post(update_cart))
        .route("/cart/remove", post(remove_from_cart))
        .route("/cart/promo", post(apply_promo))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Cart lines, subtotal and active promo", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(state.store.as_ref(), user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/add_to_cart/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "One unit added", body = ApiResponse<CartItemQuantity>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Out of stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartItemQuantity>>> {
    let resp = cart_service::add_to_cart(state.store.as_ref(), user.user_id, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/update",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Outcome of the quantity change", body = ActionResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<UpdateCartRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let payload = match action_body(payload, ITEM_NOT_FOUND) {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };
    action_reply(cart_service::update_cart(state.store.as_ref(), user.user_id, payload).await)
}

#[utoipa::path(
    post,
    path = "/cart/remove",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Outcome of the removal", body = ActionResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CartItemRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let payload = match action_body(payload, ITEM_NOT_FOUND) {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };
    action_reply(
        cart_service::remove_from_cart(state.store.as_ref(), user.user_id, payload.item_id).await,
    )
}

#[utoipa::path(
    post,
    path = "/cart/promo",
    request_body = PromoRequest,
    responses(
        (status = 200, description = "Outcome of applying the code", body = ActionResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn apply_promo(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<PromoRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let payload = match action_body(payload, "Invalid promo code") {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };
    action_reply(
        cart_service::apply_promo(state.store.as_ref(), user.user_id, &payload.promo_code).await,
    )
}
