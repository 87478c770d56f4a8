use uuid::Uuid;

use crate::{
    audit::log_audit,
    error::AppResult,
    models::Product,
    repository::{Store, WishlistInsert},
    response::{ActionResponse, ApiResponse, Meta},
};

pub async fn add_to_wishlist(
    store: &dyn Store,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<ActionResponse> {
    match store.add_to_wishlist(user_id, product_id).await? {
        WishlistInsert::AlreadyPresent => Ok(ActionResponse::failed("Item already in wishlist")),
        WishlistInsert::Added => {
            log_audit(
                store,
                Some(user_id),
                "wishlist_add",
                Some("wishlist_items"),
                Some(serde_json::json!({ "product_id": product_id })),
            )
            .await;
            Ok(ActionResponse::ok("Added to wishlist!"))
        }
    }
}

pub async fn remove_from_wishlist(
    store: &dyn Store,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<ActionResponse> {
    if !store.remove_from_wishlist(user_id, product_id).await? {
        return Ok(ActionResponse::failed("Item not found"));
    }

    log_audit(
        store,
        Some(user_id),
        "wishlist_remove",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;
    Ok(ActionResponse::ok("Removed from wishlist"))
}

pub async fn list_wishlist(store: &dyn Store, user_id: Uuid) -> AppResult<ApiResponse<Vec<Product>>> {
    let products = store.wishlist_products(user_id).await?;
    let total = products.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        products,
        Some(Meta {
            page: None,
            per_page: None,
            total: Some(total),
        }),
    ))
}
