use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Known codes and the fraction of the subtotal they take off.
const PROMO_CODES: [(&str, Decimal); 3] = [
    ("SAVE10", Decimal::from_parts(10, 0, 0, false, 2)),
    ("WELCOME20", Decimal::from_parts(20, 0, 0, false, 2)),
    ("NEWUSER", Decimal::from_parts(15, 0, 0, false, 2)),
];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AppliedPromo {
    pub code: String,
    #[schema(value_type = String, example = "0.10")]
    pub discount: Decimal,
}

impl AppliedPromo {
    /// Whole-number percentage, e.g. `10` for a 0.10 discount.
    pub fn percent(&self) -> Decimal {
        (self.discount * Decimal::ONE_HUNDRED).trunc().normalize()
    }

    pub fn applied_message(&self) -> String {
        format!("Promo code applied! {}% discount", self.percent())
    }
}

/// Resolve a user-entered code. Matching ignores case and surrounding whitespace.
pub fn lookup(raw: &str) -> Option<AppliedPromo> {
    let code = raw.trim().to_uppercase();
    PROMO_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(known, discount)| AppliedPromo {
            code: (*known).to_string(),
            discount: *discount,
        })
}
