use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        cart::{CartChange, CartMutation, QuantityAction},
        pricing, promo,
    },
    dto::cart::{CartItemDto, CartItemQuantity, CartView, UpdateCartRequest},
    error::{AppError, AppResult},
    repository::{CartUpdate, Store},
    response::{ActionResponse, ApiResponse, Meta},
};

fn quantity_after(update: &CartUpdate) -> i32 {
    match update.change {
        CartChange::Insert { quantity } | CartChange::Update { quantity } => quantity,
        CartChange::Delete => 0,
    }
}

pub async fn view_cart(store: &dyn Store, user_id: Uuid) -> AppResult<ApiResponse<CartView>> {
    let lines = store.cart_lines(user_id).await?;
    let subtotal = pricing::subtotal(&lines);
    let promo = store.active_promo(user_id).await?;
    let items: Vec<CartItemDto> = lines.into_iter().map(CartItemDto::from).collect();

    let view = CartView {
        item_count: items.len(),
        items,
        subtotal,
        promo,
    };
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_to_cart(
    store: &dyn Store,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartItemQuantity>> {
    let update = store
        .mutate_cart(user_id, product_id, CartMutation::Add)
        .await?;
    let quantity = quantity_after(&update);

    log_audit(
        store,
        Some(user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": quantity })),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} has been added to your cart!", update.product.name),
        CartItemQuantity {
            product_id,
            quantity,
        },
        None,
    ))
}

pub async fn update_cart(
    store: &dyn Store,
    user_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ActionResponse> {
    let action: QuantityAction = payload.action.parse()?;
    let update = store
        .mutate_cart(user_id, payload.item_id, CartMutation::from(action))
        .await?;

    log_audit(
        store,
        Some(user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({
            "product_id": payload.item_id,
            "quantity": quantity_after(&update),
        })),
    )
    .await;

    Ok(ActionResponse::ok("Cart updated successfully"))
}

pub async fn remove_from_cart(
    store: &dyn Store,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<ActionResponse> {
    store
        .mutate_cart(user_id, product_id, CartMutation::Remove)
        .await?;

    log_audit(
        store,
        Some(user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(ActionResponse::ok("Item removed from cart"))
}

/// Validates the code and makes it the user's single active promo.
pub async fn apply_promo(
    store: &dyn Store,
    user_id: Uuid,
    raw_code: &str,
) -> AppResult<ActionResponse> {
    let applied = promo::lookup(raw_code).ok_or(AppError::InvalidPromo)?;
    store.save_promo(user_id, &applied).await?;

    tracing::info!(user_id = %user_id, code = %applied.code, "promo applied");
    log_audit(
        store,
        Some(user_id),
        "promo_apply",
        Some("promo_sessions"),
        Some(serde_json::json!({ "code": applied.code })),
    )
    .await;

    Ok(ActionResponse::ok(applied.applied_message()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        repository::{CartRepository, MemoryStore, PromoRepository},
        services::testing::product,
    };

    fn update(item_id: Uuid, action: &str) -> UpdateCartRequest {
        UpdateCartRequest {
            item_id,
            action: action.to_string(),
        }
    }

    #[tokio::test]
    async fn add_twice_increments_quantity() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mouse = product(&store, "Mouse", "Accessories", "20.00", 5).await;

        add_to_cart(&store, user, mouse.id).await.expect("first add");
        let resp = add_to_cart(&store, user, mouse.id).await.expect("second add");
        assert_eq!(resp.message, "Mouse has been added to your cart!");
        assert_eq!(resp.data.expect("quantity").quantity, 2);

        let view = view_cart(&store, user).await.expect("view").data.expect("cart");
        assert_eq!(view.item_count, 1);
        assert_eq!(view.subtotal, Decimal::new(4000, 2));
    }

    #[tokio::test]
    async fn out_of_stock_product_cannot_be_added() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let sold_out = product(&store, "Display", "Monitors", "1599.99", 0).await;

        let err = add_to_cart(&store, user, sold_out.id)
            .await
            .expect_err("no stock");
        assert!(matches!(err, AppError::OutOfStock));
        assert!(store.cart_lines(user).await.expect("lines").is_empty());
    }

    #[tokio::test]
    async fn increase_at_stock_leaves_quantity_unchanged() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let watch = product(&store, "Watch", "Wearables", "399.99", 1).await;
        add_to_cart(&store, user, watch.id).await.expect("add");

        let err = update_cart(&store, user, update(watch.id, "increase"))
            .await
            .expect_err("at stock");
        assert!(matches!(err, AppError::InsufficientStock));
        let lines = store.cart_lines(user).await.expect("lines");
        assert_eq!(lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn decrease_at_one_removes_the_line() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let a = product(&store, "Cable", "Accessories", "9.00", 10).await;
        let b = product(&store, "Case", "Accessories", "19.00", 10).await;
        add_to_cart(&store, user, a.id).await.expect("add a");
        add_to_cart(&store, user, b.id).await.expect("add b");

        let reply = update_cart(&store, user, update(a.id, "decrease"))
            .await
            .expect("decrease");
        assert!(reply.success);
        assert_eq!(store.count_cart_items(user).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn unknown_action_and_missing_item_fail() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let cable = product(&store, "Cable", "Accessories", "9.00", 10).await;

        let err = update_cart(&store, user, update(cable.id, "explode"))
            .await
            .expect_err("bad action");
        assert!(matches!(err, AppError::InvalidAction));

        let err = remove_from_cart(&store, user, cable.id)
            .await
            .expect_err("not in cart");
        assert!(matches!(err, AppError::CartItemNotFound));
    }

    #[tokio::test]
    async fn invalid_promo_keeps_previous_one() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let reply = apply_promo(&store, user, "save10").await.expect("valid code");
        assert_eq!(reply.message, "Promo code applied! 10% discount");

        let err = apply_promo(&store, user, "BOGUS").await.expect_err("bad code");
        assert!(matches!(err, AppError::InvalidPromo));

        let active = store.active_promo(user).await.expect("read").expect("promo");
        assert_eq!(active.code, "SAVE10");
    }

    #[tokio::test]
    async fn newer_promo_replaces_older() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        apply_promo(&store, user, "SAVE10").await.expect("first");
        apply_promo(&store, user, "WELCOME20").await.expect("second");

        let active = store.active_promo(user).await.expect("read").expect("promo");
        assert_eq!(active.discount, Decimal::new(20, 2));
    }
}
