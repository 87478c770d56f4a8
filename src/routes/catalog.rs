use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{ProductDetail, ProductListing, ProductQuery, SearchQuery, SearchResults},
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/product/{id}", get(get_product))
        .route("/search", get(search))
}

#[utoipa::path(
    get,
    path = "/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Filtered product page with categories", body = ApiResponse<ProductListing>)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductListing>>> {
    let resp = catalog_service::list_products(state.store.as_ref(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product with related products", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found")
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::get_product(state.store.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Products matching the query", body = ApiResponse<SearchResults>)
    ),
    tag = "Catalog"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<SearchResults>>> {
    let resp = catalog_service::search(state.store.as_ref(), query.q).await?;
    Ok(Json(resp))
}
