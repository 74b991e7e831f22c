// storefront/src/services/payment_mock.rs

//! In-process stand-in for the payment gateway.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::services::gateway::{GatewayOrder, PaymentGateway};
use crate::services::payment_signature::PaymentSigner;

/// Issues sequential gateway order ids and can sign callbacks the way the
/// real gateway would, using the same secret as the verifier.
pub struct MockGateway {
  key_id: String,
  signer: PaymentSigner,
  next_order: AtomicU64,
  next_payment: AtomicU64,
}

/// A simulated customer payment, ready to be posted to the verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCallback {
  pub provider_order_id: String,
  pub provider_payment_id: String,
  pub signature: String,
}

impl MockGateway {
  pub fn new(key_id: &str, key_secret: &str) -> Self {
    Self {
      key_id: key_id.to_string(),
      signer: PaymentSigner::new(key_secret),
      next_order: AtomicU64::new(1),
      next_payment: AtomicU64::new(1),
    }
  }

  /// Simulates the customer paying `provider_order_id`.
  #[instrument(skip(self))]
  pub fn pay(&self, provider_order_id: &str) -> AppResult<MockCallback> {
    let n = self.next_payment.fetch_add(1, Ordering::Relaxed);
    let provider_payment_id = format!("pay_mock_{:06}", n);
    let signature = self.signer.sign(provider_order_id, &provider_payment_id)?;
    info!(%provider_payment_id, "Simulated payment captured.");
    Ok(MockCallback {
      provider_order_id: provider_order_id.to_string(),
      provider_payment_id,
      signature,
    })
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn key_id(&self) -> &str {
    &self.key_id
  }

  #[instrument(name = "MockGateway::create_order", skip(self), err(Display))]
  async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> AppResult<GatewayOrder> {
    if amount <= 0 {
      return Err(AppError::Gateway("Amount must be greater than zero".to_string()));
    }
    let n = self.next_order.fetch_add(1, Ordering::Relaxed);
    let order = GatewayOrder {
      id: format!("order_mock_{:06}", n),
      amount,
      currency: currency.to_string(),
      receipt: Some(receipt.to_string()),
      status: Some("created".to_string()),
    };
    info!(gateway_order_id = %order.id, "Simulated gateway order created.");
    Ok(order)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn issues_distinct_orders_and_verifiable_callbacks() {
    let gateway = MockGateway::new("rzp_test_mock", "s3cret");
    let first = gateway.create_order(10_000, "INR", "order_1").await.unwrap();
    let second = gateway.create_order(500, "INR", "order_2").await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.amount, 10_000);

    let callback = gateway.pay(&first.id).unwrap();
    let verifier = PaymentSigner::new("s3cret");
    assert!(verifier
      .verify(&callback.provider_order_id, &callback.provider_payment_id, &callback.signature)
      .unwrap());
  }

  #[tokio::test]
  async fn rejects_non_positive_amounts() {
    let gateway = MockGateway::new("rzp_test_mock", "s3cret");
    assert!(matches!(
      gateway.create_order(0, "INR", "order_1").await,
      Err(AppError::Gateway(_))
    ));
  }
}
