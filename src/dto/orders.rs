use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    domain::pricing::CheckoutTotals,
    dto::cart::CartItemDto,
    models::{Order, ShippingDetails},
};

pub const ORDERS_PER_PAGE: i64 = 10;
pub const RECENT_ORDERS: u64 = 5;

const COUNTRIES: [&str; 2] = ["US", "CA"];

/// Billing, shipping and payment fields submitted with `POST /checkout`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(min = 2, max = 50))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 15))]
    pub phone: String,

    #[validate(length(min = 5, max = 200))]
    pub address: String,
    #[validate(length(min = 2, max = 100))]
    pub city: String,
    #[validate(length(min = 2, max = 50))]
    pub state: String,
    #[validate(length(min = 5, max = 10))]
    pub zip_code: String,
    #[validate(custom(function = "validate_country"))]
    pub country: String,

    #[validate(length(min = 13, max = 19), custom(function = "validate_digits"))]
    pub card_number: String,
    #[validate(custom(function = "validate_expiry_month"))]
    pub expiry_month: String,
    #[validate(range(min = 2024, max = 2034))]
    pub expiry_year: i32,
    #[validate(length(min = 3, max = 4), custom(function = "validate_digits"))]
    pub cvv: String,
}

impl CheckoutRequest {
    /// Contact and shipping data to persist. Only the last four card digits are kept.
    pub fn shipping_details(&self) -> ShippingDetails {
        let digits: Vec<char> = self.card_number.chars().filter(char::is_ascii_digit).collect();
        let card_last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        ShippingDetails {
            full_name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            country: self.country.trim().to_uppercase(),
            card_last4,
        }
    }
}

fn validate_country(value: &str) -> Result<(), ValidationError> {
    if COUNTRIES.contains(&value.trim().to_uppercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("country"))
    }
}

fn validate_digits(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("digits"))
    }
}

fn validate_expiry_month(value: &str) -> Result<(), ValidationError> {
    match value.parse::<u8>() {
        Ok(month) if (1..=12).contains(&month) && value.len() == 2 => Ok(()),
        _ => Err(ValidationError::new("expiry_month")),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSummary {
    pub items: Vec<CartItemDto>,
    #[serde(flatten)]
    pub totals: CheckoutTotals,
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub recent_orders: Vec<Order>,
    pub cart_count: u64,
    pub wishlist_count: u64,
    #[schema(value_type = String)]
    pub total_spent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_checkout() -> CheckoutRequest {
        CheckoutRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "5551234567".into(),
            address: "12 Analytical Way".into(),
            city: "London".into(),
            state: "ON".into(),
            zip_code: "12345".into(),
            country: "ca".into(),
            card_number: "4111111111111111".into(),
            expiry_month: "07".into(),
            expiry_year: 2030,
            cvv: "123".into(),
        }
    }

    #[test]
    fn sample_form_is_valid() {
        assert!(sample_checkout().validate().is_ok());
    }

    #[test]
    fn bad_payment_fields_are_rejected() {
        let mut form = sample_checkout();
        form.card_number = "4111-1111-1111".into();
        form.expiry_month = "13".into();
        form.cvv = "12a".into();
        form.country = "MX".into();
        let errors = form.validate().expect_err("invalid payment data");
        let fields = errors.field_errors();
        for field in ["card_number", "expiry_month", "cvv", "country"] {
            assert!(fields.contains_key(field), "{field} should fail");
        }
    }

    #[test]
    fn only_last_four_digits_are_kept() {
        let details = sample_checkout().shipping_details();
        assert_eq!(details.card_last4, "1111");
        assert_eq!(details.full_name, "Ada Lovelace");
        assert_eq!(details.country, "CA");
    }
}
