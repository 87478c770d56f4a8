use uuid::Uuid;

use crate::{
    dto::orders::ORDERS_PER_PAGE,
    error::{AppError, AppResult},
    models::{Order, OrderWithItems},
    repository::Store,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

pub async fn list_orders(
    store: &dyn Store,
    user_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let (page, per_page, window) = pagination.window(ORDERS_PER_PAGE);
    let result = store.list_orders(user_id, window).await?;

    let meta = Meta::new(page, per_page, result.total as i64);
    Ok(ApiResponse::success("OK", result.items, Some(meta)))
}

/// Only the owner can read an order; anyone else gets `NotFound`.
pub async fn get_order(
    store: &dyn Store,
    user_id: Uuid,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = store
        .find_order(user_id, order_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", order, None))
}
