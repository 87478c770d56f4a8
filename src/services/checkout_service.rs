use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    domain::pricing::{self, PricingContext},
    dto::{
        cart::CartItemDto,
        orders::{CheckoutRequest, CheckoutSummary},
    },
    error::{AppError, AppResult},
    models::OrderWithItems,
    repository::Store,
    response::{ApiResponse, Meta},
};

/// Loads the caller's active promo into an explicit pricing context.
pub async fn pricing_context(store: &dyn Store, user_id: Uuid) -> AppResult<PricingContext> {
    Ok(PricingContext::with_promo(store.active_promo(user_id).await?))
}

pub async fn checkout_summary(
    store: &dyn Store,
    user_id: Uuid,
) -> AppResult<ApiResponse<CheckoutSummary>> {
    let lines = store.cart_lines(user_id).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let ctx = pricing_context(store, user_id).await?;
    let totals = pricing::checkout_totals(pricing::subtotal(&lines), &ctx);
    let summary = CheckoutSummary {
        items: lines.into_iter().map(CartItemDto::from).collect(),
        totals,
        promo_code: ctx.promo.map(|promo| promo.code),
    };
    Ok(ApiResponse::success("OK", summary, Some(Meta::empty())))
}

pub async fn place_order(
    store: &dyn Store,
    user_id: Uuid,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;

    let ctx = pricing_context(store, user_id).await?;
    let placed = store
        .place_order(user_id, &ctx, payload.shipping_details())
        .await?;

    tracing::info!(
        user_id = %user_id,
        order_id = %placed.order.id,
        total = %placed.order.total,
        "order placed"
    );
    log_audit(
        store,
        Some(user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": placed.order.id,
            "total": placed.order.total.to_string(),
            "promo_code": placed.order.promo_code,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        placed,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        domain::promo,
        repository::{
            CartRepository, CatalogRepository, MemoryStore, OrderRepository, PromoRepository,
        },
        services::{cart_service, testing::product},
    };

    fn checkout_form() -> CheckoutRequest {
        CheckoutRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "5551234567".into(),
            address: "12 Analytical Way".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "US".into(),
            card_number: "4242424242424242".into(),
            expiry_month: "12".into(),
            expiry_year: 2030,
            cvv: "321".into(),
        }
    }

    #[tokio::test]
    async fn empty_cart_has_no_summary() {
        let store = MemoryStore::new();
        let err = checkout_summary(&store, Uuid::new_v4())
            .await
            .expect_err("empty cart");
        assert!(matches!(err, AppError::EmptyCart));
    }

    #[tokio::test]
    async fn summary_uses_active_promo() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let item = product(&store, "Charger", "Accessories", "30.00", 10).await;
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");
        store
            .save_promo(user, &promo::lookup("SAVE10").expect("known"))
            .await
            .expect("promo");

        let summary = checkout_summary(&store, user)
            .await
            .expect("summary")
            .data
            .expect("data");
        assert_eq!(summary.totals.shipping, Decimal::ZERO);
        assert_eq!(summary.totals.tax, Decimal::new(480, 2));
        assert_eq!(summary.totals.discount, Decimal::new(600, 2));
        assert_eq!(summary.totals.total, Decimal::new(5880, 2));
        assert_eq!(summary.promo_code.as_deref(), Some("SAVE10"));
    }

    #[tokio::test]
    async fn placing_an_order_consumes_cart_stock_and_promo() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let item = product(&store, "Keyboard", "Accessories", "20.00", 5).await;
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");
        cart_service::apply_promo(&store, user, "NEWUSER").await.expect("promo");

        let placed = place_order(&store, user, checkout_form())
            .await
            .expect("order")
            .data
            .expect("order data");

        assert_eq!(placed.order.status, "pending");
        assert_eq!(placed.order.card_last4, "4242");
        assert_eq!(placed.order.promo_code.as_deref(), Some("NEWUSER"));
        assert_eq!(placed.order.subtotal, Decimal::new(4000, 2));
        assert_eq!(placed.order.total, Decimal::new(4719, 2));
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].unit_price, Decimal::new(2000, 2));

        let stock = store
            .find_product(item.id)
            .await
            .expect("lookup")
            .expect("product")
            .stock;
        assert_eq!(stock, 3);
        assert!(store.cart_lines(user).await.expect("lines").is_empty());
        assert!(store.active_promo(user).await.expect("promo").is_none());

        let audit = store.audit_entries().await;
        let last = audit.last().expect("audit entry");
        assert_eq!(last.action, "order_place");
        assert_eq!(last.user_id, Some(user));
    }

    #[tokio::test]
    async fn invalid_form_places_nothing() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let item = product(&store, "Keyboard", "Accessories", "20.00", 5).await;
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");

        let mut form = checkout_form();
        form.zip_code = "1".into();
        let err = place_order(&store, user, form).await.expect_err("invalid zip");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.count_cart_items(user).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn promo_applied_after_pricing_survives_the_order() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let item = product(&store, "Keyboard", "Accessories", "20.00", 5).await;

        // Priced without a promo, then a code lands before the order commits.
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");
        let ctx = pricing_context(&store, user).await.expect("context");
        cart_service::apply_promo(&store, user, "SAVE10").await.expect("promo");
        let placed = store
            .place_order(user, &ctx, checkout_form().shipping_details())
            .await
            .expect("order");
        assert_eq!(placed.order.discount, Decimal::ZERO);
        let kept = store.active_promo(user).await.expect("read").expect("promo kept");
        assert_eq!(kept.code, "SAVE10");

        // Priced with SAVE10, then replaced by WELCOME20 before the order commits.
        cart_service::add_to_cart(&store, user, item.id).await.expect("add");
        let ctx = pricing_context(&store, user).await.expect("context");
        cart_service::apply_promo(&store, user, "WELCOME20").await.expect("promo");
        let placed = store
            .place_order(user, &ctx, checkout_form().shipping_details())
            .await
            .expect("order");
        assert_eq!(placed.order.promo_code.as_deref(), Some("SAVE10"));
        let kept = store.active_promo(user).await.expect("read").expect("promo kept");
        assert_eq!(kept.code, "WELCOME20");
    }
}
