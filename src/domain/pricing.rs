//! Checkout arithmetic. All amounts are decimal; tax and discount are rounded
//! to cents before the total is summed so the parts add up exactly.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{domain::promo::AppliedPromo, models::CartLine};

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(5000, 0, 0, false, 2);
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(999, 0, 0, false, 2);
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Per-request inputs to the calculator besides the cart itself.
#[derive(Debug, Clone, Default)]
pub struct PricingContext {
    pub promo: Option<AppliedPromo>,
}

impl PricingContext {
    pub fn with_promo(promo: Option<AppliedPromo>) -> Self {
        Self { promo }
    }

    fn discount_fraction(&self) -> Decimal {
        self.promo
            .as_ref()
            .map(|promo| promo.discount)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CheckoutTotals {
    #[schema(value_type = String, example = "60.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub shipping: Decimal,
    #[schema(value_type = String, example = "4.80")]
    pub tax: Decimal,
    #[schema(value_type = String, example = "6.00")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "58.80")]
    pub total: Decimal,
}

pub fn subtotal<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> Decimal {
    lines.into_iter().map(CartLine::line_total).sum()
}

pub fn checkout_totals(subtotal: Decimal, ctx: &PricingContext) -> CheckoutTotals {
    let subtotal = cents(subtotal);
    let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
        cents(Decimal::ZERO)
    } else {
        FLAT_SHIPPING
    };
    let tax = cents(subtotal * TAX_RATE);
    let discount = cents(subtotal * ctx.discount_fraction());
    let total = cents(subtotal + shipping + tax - discount);

    CheckoutTotals {
        subtotal,
        shipping,
        tax,
        discount,
        total,
    }
}

fn cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
