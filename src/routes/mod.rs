use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    error::AppResult,
    response::{ActionResponse, ApiResponse, Meta},
    state::AppState,
};

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod wishlist;

/// Every route of the storefront; state is provided at the top level.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(catalog::router())
        .merge(cart::router())
        .merge(wishlist::router())
        .merge(orders::router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
}

/// Folds a failed action into `{success: false}` so clients get a 200 either way.
pub(crate) fn action_reply(result: AppResult<ActionResponse>) -> Json<ActionResponse> {
    Json(result.unwrap_or_else(|err| {
        err.log();
        ActionResponse::failed(err.public_message())
    }))
}

/// Unwraps an action body, or answers `{success: false, message}` when it did not parse.
pub(crate) fn action_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    message: &str,
) -> Result<T, Json<ActionResponse>> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected action body");
        Json(ActionResponse::failed(message))
    })
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
