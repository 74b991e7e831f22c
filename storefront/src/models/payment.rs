// storefront/src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};

/// `Initiated -> Success`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Initiated,
  Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Payment {
  pub id: i64,
  /// Owning order, set when the gateway order was created through us.
  pub order_id: Option<i64>,
  pub provider_order_id: String,
  pub provider_payment_id: Option<String>,
  pub signature: Option<String>,
  /// Gateway-confirmed amount in minor currency units.
  pub amount: Option<i64>,
  pub currency: Option<String>,
  pub status: PaymentStatus,
  pub created_at: DateTime<Utc>,
  pub verified_at: Option<DateTime<Utc>>,
}

impl Payment {
  pub fn is_verified(&self) -> bool {
    self.status == PaymentStatus::Success
  }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
  pub order_id: Option<i64>,
  pub provider_order_id: String,
  pub provider_payment_id: Option<String>,
  pub signature: Option<String>,
  pub amount: Option<i64>,
  pub currency: Option<String>,
  pub status: PaymentStatus,
}

impl NewPayment {
  /// A gateway order we created for `order_id`, awaiting the callback.
  pub fn initiated(order_id: i64, provider_order_id: String, amount: i64, currency: String) -> Self {
    Self {
      order_id: Some(order_id),
      provider_order_id,
      provider_payment_id: None,
      signature: None,
      amount: Some(amount),
      currency: Some(currency),
      status: PaymentStatus::Initiated,
    }
  }

  /// A verified callback for a gateway order we have no record of.
  pub fn standalone_success(provider_order_id: String, provider_payment_id: String, signature: String) -> Self {
    Self {
      order_id: None,
      provider_order_id,
      provider_payment_id: Some(provider_payment_id),
      signature: Some(signature),
      amount: None,
      currency: None,
      status: PaymentStatus::Success,
    }
  }
}
