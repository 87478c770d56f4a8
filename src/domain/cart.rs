//! Cart quantity rules.
//!
//! Storage implementations read the current row and the product's stock,
//! ask [`plan`] what to do, and write the result inside one transaction.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    Add,
    Increase,
    Decrease,
    Remove,
}

/// Quantity actions accepted by `POST /cart/update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
    Increase,
    Decrease,
}

impl FromStr for QuantityAction {
    type Err = CartRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(QuantityAction::Increase),
            "decrease" => Ok(QuantityAction::Decrease),
            _ => Err(CartRuleError::UnknownAction),
        }
    }
}

impl From<QuantityAction> for CartMutation {
    fn from(action: QuantityAction) -> Self {
        match action {
            QuantityAction::Increase => CartMutation::Increase,
            QuantityAction::Decrease => CartMutation::Decrease,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Insert { quantity: i32 },
    Update { quantity: i32 },
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartRuleError {
    #[error("product is out of stock")]
    OutOfStock,
    #[error("not enough stock available")]
    InsufficientStock,
    #[error("item is not in the cart")]
    ItemNotFound,
    #[error("unknown cart action")]
    UnknownAction,
}

/// Decide how a cart row changes. `current` is the row's quantity, if the row exists.
pub fn plan(
    mutation: CartMutation,
    current: Option<i32>,
    stock: i32,
) -> Result<CartChange, CartRuleError> {
    match (mutation, current) {
        (CartMutation::Add, _) if stock <= 0 => Err(CartRuleError::OutOfStock),
        (CartMutation::Add, None) => Ok(CartChange::Insert { quantity: 1 }),
        (CartMutation::Add | CartMutation::Increase, Some(quantity)) => {
            if quantity < stock {
                Ok(CartChange::Update {
                    quantity: quantity + 1,
                })
            } else {
                Err(CartRuleError::InsufficientStock)
            }
        }
        (CartMutation::Decrease, Some(quantity)) if quantity > 1 => Ok(CartChange::Update {
            quantity: quantity - 1,
        }),
        (CartMutation::Decrease | CartMutation::Remove, Some(_)) => Ok(CartChange::Delete),
        (CartMutation::Increase | CartMutation::Decrease | CartMutation::Remove, None) => {
            Err(CartRuleError::ItemNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_row_with_one_unit() {
        assert_eq!(
            plan(CartMutation::Add, None, 5),
            Ok(CartChange::Insert { quantity: 1 })
        );
    }

    #[test]
    fn add_increments_existing_row() {
        assert_eq!(
            plan(CartMutation::Add, Some(2), 5),
            Ok(CartChange::Update { quantity: 3 })
        );
    }

    #[test]
    fn add_rejects_product_without_stock() {
        assert_eq!(
            plan(CartMutation::Add, None, 0),
            Err(CartRuleError::OutOfStock)
        );
        assert_eq!(
            plan(CartMutation::Add, Some(1), 0),
            Err(CartRuleError::OutOfStock)
        );
    }

    #[test]
    fn add_never_exceeds_stock() {
        assert_eq!(
            plan(CartMutation::Add, Some(3), 3),
            Err(CartRuleError::InsufficientStock)
        );
    }

    #[test]
    fn increase_at_stock_is_refused() {
        assert_eq!(
            plan(CartMutation::Increase, Some(4), 4),
            Err(CartRuleError::InsufficientStock)
        );
        assert_eq!(
            plan(CartMutation::Increase, Some(3), 4),
            Ok(CartChange::Update { quantity: 4 })
        );
    }

    #[test]
    fn decrease_removes_last_unit() {
        assert_eq!(
            plan(CartMutation::Decrease, Some(1), 10),
            Ok(CartChange::Delete)
        );
        assert_eq!(
            plan(CartMutation::Decrease, Some(2), 10),
            Ok(CartChange::Update { quantity: 1 })
        );
    }

    #[test]
    fn decrease_works_when_stock_dropped_below_quantity() {
        assert_eq!(
            plan(CartMutation::Decrease, Some(5), 2),
            Ok(CartChange::Update { quantity: 4 })
        );
    }

    #[test]
    fn missing_rows_cannot_be_changed() {
        for mutation in [
            CartMutation::Increase,
            CartMutation::Decrease,
            CartMutation::Remove,
        ] {
            assert_eq!(plan(mutation, None, 10), Err(CartRuleError::ItemNotFound));
        }
    }

    #[test]
    fn quantity_actions_parse_case_insensitively() {
        assert_eq!("Increase".parse(), Ok(QuantityAction::Increase));
        assert_eq!(" decrease ".parse(), Ok(QuantityAction::Decrease));
        assert_eq!(
            "double".parse::<QuantityAction>(),
            Err(CartRuleError::UnknownAction)
        );
    }

    #[test]
    fn remove_deletes_regardless_of_quantity() {
        assert_eq!(plan(CartMutation::Remove, Some(7), 1), Ok(CartChange::Delete));
    }
}
