// storefront/src/models/cart.rs

//! The cart payload submitted for order placement and its validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One cart entry as sent by the client. The product may be named by
/// `product_id` or, for older clients, by `id`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CartItemInput {
  pub product_id: Option<i64>,
  pub id: Option<i64>,
  pub quantity: Option<i32>,
  pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaceOrderRequest {
  pub user_id: Option<i64>,
  pub total_amount: Option<Decimal>,
  pub shipping_address: Option<String>,
  #[serde(default)]
  pub items: Vec<CartItemInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
  pub product_id: i64,
  pub quantity: i32,
  pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCart {
  pub user_id: i64,
  pub total_amount: Decimal,
  pub shipping_address: Option<String>,
  pub lines: Vec<CartLine>,
}

/// Largest value a `NUMERIC(12,2)` money column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

impl ValidatedCart {
  /// Σ price × quantity, or a `Validation` error when the sum cannot be represented.
  pub fn lines_total(&self) -> Result<Decimal, AppError> {
    self.lines.iter().try_fold(Decimal::ZERO, |acc, line| {
      line
        .price
        .checked_mul(Decimal::from(line.quantity))
        .and_then(|subtotal| acc.checked_add(subtotal))
        .ok_or_else(|| AppError::Validation("Order total is out of range".to_string()))
    })
  }
}

impl PlaceOrderRequest {
  /// Checks every precondition of order placement without touching the store.
  pub fn validate(&self) -> Result<ValidatedCart, AppError> {
    let (Some(user_id), Some(total_amount)) = (self.user_id, self.total_amount) else {
      return Err(AppError::Validation(
        "Missing required fields: user_id, total_amount, or items".to_string(),
      ));
    };
    if self.items.is_empty() {
      return Err(AppError::Validation(
        "Missing required fields: user_id, total_amount, or items".to_string(),
      ));
    }
    if total_amount <= Decimal::ZERO {
      return Err(AppError::Validation("total_amount must be greater than zero".to_string()));
    }
    if total_amount > MAX_MONEY {
      return Err(AppError::Validation("total_amount is out of range".to_string()));
    }

    let lines = self
      .items
      .iter()
      .enumerate()
      .map(|(idx, item)| validate_item(idx, item))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidatedCart {
      user_id,
      total_amount,
      shipping_address: self
        .shipping_address
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()),
      lines,
    })
  }
}

fn validate_item(idx: usize, item: &CartItemInput) -> Result<CartLine, AppError> {
  let invalid = |reason: &str| AppError::Validation(format!("Invalid item data at position {}: {}", idx, reason));

  let product_id = item.product_id.or(item.id).ok_or_else(|| invalid("missing product reference"))?;
  let quantity = item.quantity.ok_or_else(|| invalid("missing quantity"))?;
  if quantity <= 0 {
    return Err(invalid("quantity must be positive"));
  }
  let price = item.price.ok_or_else(|| invalid("missing price"))?;
  if price < Decimal::ZERO {
    return Err(invalid("price cannot be negative"));
  }
  if price > MAX_MONEY {
    return Err(invalid("price is out of range"));
  }
  Ok(CartLine {
    product_id,
    quantity,
    price,
  })
}
