// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 6] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = AppError;

  /// Exact, lowercase match against the known statuses.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| AppError::Validation(format!("Invalid status '{}'", s)))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub user_id: i64,
  pub total_amount: Decimal,
  pub shipping_address: Option<String>,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}

/// Header row written by order placement; always starts `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: i64,
  pub total_amount: Decimal,
  pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLineView {
  pub product_id: i64,
  pub quantity: i32,
  pub price: Decimal,
  /// Live product name; `None` when the product row is gone.
  pub product_name: Option<String>,
}

/// An order with its line items, as returned by the order listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLineView>,
}
