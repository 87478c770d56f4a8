use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};

use crate::{
    dto::wishlist::WishlistRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::{ActionResponse, ApiResponse},
    routes::{action_body, action_reply},
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(list_wishlist))
        .route("/wishlist/add", post(add_to_wishlist))
        .route("/wishlist/remove", post(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/wishlist",
    responses(
        (status = 200, description = "Wishlisted products, newest first", body = ApiResponse<Vec<Product>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let resp = wishlist_service::list_wishlist(state.store.as_ref(), user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/wishlist/add",
    request_body = WishlistRequest,
    responses((status = 200, description = "Outcome of the insert", body = ActionResponse)),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<WishlistRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let payload = match action_body(payload, "Item not found") {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };
    action_reply(
        wishlist_service::add_to_wishlist(state.store.as_ref(), user.user_id, payload.item_id)
            .await,
    )
}

#[utoipa::path(
    post,
    path = "/wishlist/remove",
    request_body = WishlistRequest,
    responses((status = 200, description = "Outcome of the removal", body = ActionResponse)),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<WishlistRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let payload = match action_body(payload, "Item not found") {
        Ok(payload) => payload,
        Err(reply) => return reply,
    };
    action_reply(
        wishlist_service::remove_from_wishlist(state.store.as_ref(), user.user_id, payload.item_id)
            .await,
    )
}
