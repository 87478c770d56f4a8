use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{domain::promo::AppliedPromo, models::{CartLine, Product}};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    /// Product id of the cart line.
    pub item_id: Uuid,
    /// `increase` or `decrease`.
    pub action: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemRequest {
    /// Product id of the cart line.
    pub item_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromoRequest {
    #[serde(default)]
    pub promo_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub product: Product,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

impl From<CartLine> for CartItemDto {
    fn from(line: CartLine) -> Self {
        let line_total = line.line_total();
        Self {
            product: line.product,
            quantity: line.quantity,
            line_total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItemDto>,
    pub item_count: usize,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    pub promo: Option<AppliedPromo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemQuantity {
    pub product_id: Uuid,
    /// Zero once the line has been removed.
    pub quantity: i32,
}
