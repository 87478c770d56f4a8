use uuid::Uuid;

use crate::{
    dto::orders::{Dashboard, RECENT_ORDERS},
    error::AppResult,
    repository::{PageWindow, Store},
    response::{ApiResponse, Meta},
};

pub async fn dashboard(store: &dyn Store, user_id: Uuid) -> AppResult<ApiResponse<Dashboard>> {
    let recent = store
        .list_orders(user_id, PageWindow::first(RECENT_ORDERS))
        .await?;
    let data = Dashboard {
        recent_orders: recent.items,
        cart_count: store.count_cart_items(user_id).await?,
        wishlist_count: store.count_wishlist_items(user_id).await?,
        total_spent: store.total_spent(user_id).await?,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}
